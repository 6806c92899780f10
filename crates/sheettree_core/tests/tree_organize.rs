use sheettree_core::{
    decode, encode, organize, OrganizeError, Record, RecordKind, Row, ROOT_RECORD_ID,
};
use uuid::Uuid;

fn row(cells: &[&str]) -> Row {
    cells.iter().map(|cell| cell.to_string()).collect()
}

fn names(records: &[Record]) -> Vec<&str> {
    records.iter().map(Record::name).collect()
}

fn indices(records: &[Record]) -> Vec<Option<u32>> {
    records.iter().map(|record| record.position().index()).collect()
}

#[test]
fn folder_with_two_files_organizes_in_row_order() {
    let (p, c1, c2) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
    let rows = vec![
        row(&[&p.to_string(), "", "d", "Files"]),
        row(&[&c1.to_string(), &p.to_string(), "f", "a.txt"]),
        row(&[&c2.to_string(), &p.to_string(), "f", "b.txt"]),
    ];

    let forest = organize(decode(&rows).unwrap()).unwrap();
    assert_eq!(forest.len(), 1);
    let folder = &forest[0];
    assert_eq!(folder.id(), p);
    assert_eq!(folder.kind(), RecordKind::Container);
    assert_eq!(names(folder.children()), vec!["a.txt", "b.txt"]);
    assert_eq!(indices(folder.children()), vec![Some(2), Some(3)]);

    let root = Record::root(forest);
    assert_eq!(root.id(), ROOT_RECORD_ID);
    assert_eq!(root.node_count(), 4);
}

#[test]
fn leaf_with_unknown_parent_stays_top_level() {
    let orphan = Uuid::new_v4();
    let rows = vec![row(&[
        &orphan.to_string(),
        &Uuid::new_v4().to_string(),
        "f",
        "lost.txt",
    ])];

    let forest = organize(decode(&rows).unwrap()).unwrap();
    assert_eq!(names(&forest), vec!["lost.txt"]);
    assert_eq!(forest[0].id(), orphan);
}

#[test]
fn children_listed_before_parents_still_nest() {
    let (outer, inner, file) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
    let rows = vec![
        row(&[&file.to_string(), &inner.to_string(), "f", "deep.txt"]),
        row(&[&inner.to_string(), &outer.to_string(), "d", "inner"]),
        row(&[&outer.to_string(), "", "d", "outer"]),
        row(&[&Uuid::new_v4().to_string(), "", "f", "top.txt"]),
    ];

    let forest = organize(decode(&rows).unwrap()).unwrap();
    assert_eq!(names(&forest), vec!["outer", "top.txt"]);
    let inner_record = &forest[0].children()[0];
    assert_eq!(inner_record.id(), inner);
    assert_eq!(names(inner_record.children()), vec!["deep.txt"]);
}

#[test]
fn siblings_are_ordered_by_row_at_every_level() {
    let folder = Uuid::new_v4();
    let rows = vec![
        row(&[&Uuid::new_v4().to_string(), &folder.to_string(), "f", "third"]),
        row(&[&Uuid::new_v4().to_string(), "", "f", "loose"]),
        row(&[&folder.to_string(), "", "d", "folder"]),
        row(&[&Uuid::new_v4().to_string(), &folder.to_string(), "f", "fourth"]),
    ];

    let root = Record::root(organize(decode(&rows).unwrap()).unwrap());
    for container in std::iter::once(&root).chain(root.flatten()) {
        let order = indices(container.children());
        assert!(order.windows(2).all(|pair| pair[0] <= pair[1]), "{order:?}");
    }
    assert_eq!(names(root.children()), vec!["loose", "folder"]);
}

#[test]
fn blank_rows_are_skipped_but_keep_row_numbers() {
    let rows = vec![
        row(&[&Uuid::new_v4().to_string(), "", "f", "first"]),
        Vec::new(),
        row(&[&Uuid::new_v4().to_string(), "", "f", "third"]),
    ];

    let records = decode(&rows).unwrap();
    assert_eq!(names(&records), vec!["first", "third"]);
    assert_eq!(indices(&records), vec![Some(1), Some(3)]);
}

#[test]
fn encode_then_decode_keeps_identity_fields_in_order() {
    let folder = Uuid::new_v4();
    let records = vec![
        Record::new(
            folder,
            None,
            "Reports",
            RecordKind::Container,
            Default::default(),
        ),
        Record::new(
            Uuid::new_v4(),
            Some(folder),
            "  padded name ",
            RecordKind::Leaf,
            Default::default(),
        ),
    ];

    let decoded = decode(&encode(&records)).unwrap();
    let identity = |record: &Record| {
        (
            record.id(),
            record.parent_id(),
            record.kind(),
            record.name().to_string(),
        )
    };
    assert_eq!(
        decoded.iter().map(identity).collect::<Vec<_>>(),
        records.iter().map(identity).collect::<Vec<_>>()
    );
}

#[test]
fn organize_is_idempotent_on_its_output() {
    let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
    let rows = vec![
        row(&[&a.to_string(), "", "d", "a"]),
        row(&[&b.to_string(), &a.to_string(), "d", "b"]),
        row(&[&Uuid::new_v4().to_string(), &b.to_string(), "f", "b1"]),
        row(&[&Uuid::new_v4().to_string(), &a.to_string(), "f", "a1"]),
        row(&[&Uuid::new_v4().to_string(), &Uuid::new_v4().to_string(), "f", "orphan"]),
    ];

    let once = organize(decode(&rows).unwrap()).unwrap();
    let twice = organize(once.clone()).unwrap();
    assert_eq!(once, twice);
}

#[test]
fn cyclic_containers_are_reported() {
    let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
    let rows = vec![
        row(&[&a.to_string(), &b.to_string(), "d", "a"]),
        row(&[&b.to_string(), &a.to_string(), "d", "b"]),
    ];

    let err = organize(decode(&rows).unwrap()).unwrap_err();
    let OrganizeError::CycleDetected { ids } = err;
    assert_eq!(ids.len(), 2);
    assert!(ids.contains(&a) && ids.contains(&b));
}

#[test]
fn unknown_kind_fails_the_batch() {
    let rows = vec![
        row(&[&Uuid::new_v4().to_string(), "", "f", "fine"]),
        row(&[&Uuid::new_v4().to_string(), "", "x", "broken"]),
    ];

    let err = decode(&rows).unwrap_err();
    assert!(err.to_string().contains("row 2"));
}

#[test]
fn corrupt_parent_cell_leaves_record_top_level() {
    let folder = Uuid::new_v4();
    let rows = vec![
        row(&[&folder.to_string(), "", "d", "docs"]),
        row(&[&Uuid::new_v4().to_string(), &folder.to_string(), "f", "inside.txt"]),
        row(&[&Uuid::new_v4().to_string(), "not-a-uuid", "f", "stray.txt"]),
    ];

    let forest = organize(decode(&rows).unwrap()).unwrap();
    assert_eq!(names(&forest), vec!["docs", "stray.txt"]);
    assert_eq!(names(forest[0].children()), vec!["inside.txt"]);
    assert!(forest[1].parent_id().is_none());
}

#[test]
fn non_uuid_record_ids_fail_the_batch() {
    let rows = vec![
        row(&["P", "", "d", "Files"]),
        row(&["C1", "P", "f", "a.txt"]),
    ];

    let err = decode(&rows).unwrap_err();
    assert!(err.to_string().contains("`P`"));
}
