mod common;

use std::{fs::File, io::Cursor};

use chrono::{NaiveDate, NaiveDateTime};
use common::{
    Cell::{self, Blank, Bool, Number, Text},
    SheetSpec, TestWorkspace, date, employee_sheet, workbook_bytes,
};
use rust_decimal::Decimal;
use sheet_records::{ExtractError, Extractor, Record, SheetSelector, record};
use uuid::Uuid;

#[derive(Debug, Default, Clone, PartialEq)]
struct Employee {
    name: String,
    age: Option<i32>,
    salary: Option<Decimal>,
    join_date: NaiveDate,
    last_active: Option<NaiveDateTime>,
}

record!(Employee {
    name: String => ["Full Name", "Name"],
    age: Option<i32> => ["Age"],
    salary: Option<Decimal> => ["Salary"],
    join_date: NaiveDate => ["Join Date"],
    last_active: Option<NaiveDateTime> => ["Last Active"],
});

#[derive(Debug, Default)]
struct Unbound {
    label: String,
    count: i32,
}

record!(Unbound {
    label: String,
    count: i32,
});

#[derive(Debug, Default, PartialEq)]
struct Contact {
    email: String,
    phone: String,
    score: i64,
}

record!(Contact {
    email: String => ["Email Address", "Email"],
    phone: String => ["Phone"],
    score: i64 => ["Score"],
});

#[derive(Debug, Default, PartialEq)]
struct Member {
    user_id: Uuid,
    name: String,
}

record!(Member {
    user_id: Uuid => ["User Id"],
    name: String => ["Name"],
});

#[derive(Debug, Default, PartialEq)]
struct Positional {
    code: String,
    quantity: u32,
    active: bool,
    note: Option<String>,
}

record!(Positional {
    code: String,
    quantity: u32,
    active: bool,
    note: Option<String>,
});

fn alice_row() -> Vec<Cell> {
    vec![
        Text("Alice"),
        Number(25.0),
        Number(50000.75),
        date(2020, 5, 1),
        Blank,
    ]
}

fn from_sheets(sheets: &[SheetSpec]) -> Extractor {
    Extractor::builder().from_bytes(workbook_bytes(sheets))
}

#[test]
fn header_mode_maps_columns_by_name() {
    let extractor = from_sheets(&[employee_sheet(vec![alice_row()])]);
    let employees = extractor.extract::<Employee>().expect("extract employees");
    assert_eq!(
        employees,
        [Employee {
            name: "Alice".into(),
            age: Some(25),
            salary: Some(Decimal::new(5000075, 2)),
            join_date: NaiveDate::from_ymd_opt(2020, 5, 1).unwrap(),
            last_active: None,
        }]
    );
}

#[test]
fn blank_optional_number_stays_absent() {
    let extractor = from_sheets(&[employee_sheet(vec![vec![
        Text("Bob"),
        Blank,
        Number(42000.0),
        date(2021, 1, 15),
        Blank,
    ]])]);
    let employees = extractor.extract::<Employee>().expect("extract employees");
    assert_eq!(employees[0].age, None);
    assert_eq!(employees[0].salary, Some(Decimal::new(42000, 0)));
}

#[test]
fn record_count_matches_used_data_rows() {
    let rows = (0..25)
        .map(|i| {
            vec![
                Text("Worker"),
                Number(f64::from(20 + i)),
                Blank,
                date(2022, 3, 1),
                Blank,
            ]
        })
        .collect::<Vec<_>>();
    let extractor = from_sheets(&[employee_sheet(rows)]);
    let employees = extractor.extract::<Employee>().expect("extract employees");
    assert_eq!(employees.len(), 25);
    let ages = employees.iter().map(|e| e.age.unwrap()).collect::<Vec<_>>();
    assert_eq!(ages, (20..45).collect::<Vec<_>>());
}

#[test]
fn blank_rows_inside_the_range_are_skipped() {
    let extractor = from_sheets(&[employee_sheet(vec![
        alice_row(),
        vec![Blank, Blank, Blank, Blank, Blank],
        vec![Text("Carol"), Number(31.0), Blank, date(2019, 7, 9), Blank],
    ])]);
    let names = extractor
        .extract::<Employee>()
        .expect("extract employees")
        .into_iter()
        .map(|e| e.name)
        .collect::<Vec<_>>();
    assert_eq!(names, ["Alice", "Carol"]);
}

#[test]
fn records_without_binding_metadata_fail_before_reading() {
    let extractor = Extractor::builder().from_bytes(b"definitely not a workbook".to_vec());
    let err = extractor.extract::<Unbound>().unwrap_err();
    assert!(matches!(
        err,
        ExtractError::MissingBindingMetadata { record: "Unbound" }
    ));
}

#[test]
fn first_listed_candidate_column_wins() {
    let extractor = from_sheets(&[SheetSpec::new(
        "Contacts",
        vec![
            vec![Text("Email"), Text("Email Address"), Text("Score")],
            vec![Text("old@example.com"), Text("new@example.com"), Number(7.0)],
        ],
    )]);
    let contacts = extractor.extract::<Contact>().expect("extract contacts");
    assert_eq!(contacts[0].email, "new@example.com");
}

#[test]
fn fallback_candidate_binds_when_primary_is_absent() {
    let extractor = from_sheets(&[SheetSpec::new(
        "Contacts",
        vec![
            vec![Text("Score"), Text("Email")],
            vec![Number(3.0), Text("only@example.com")],
        ],
    )]);
    let contacts = extractor.extract::<Contact>().expect("extract contacts");
    assert_eq!(
        contacts,
        [Contact {
            email: "only@example.com".into(),
            phone: String::new(),
            score: 3,
        }]
    );
}

#[test]
fn malformed_uuid_reports_row_and_column() {
    let extractor = from_sheets(&[SheetSpec::new(
        "Members",
        vec![
            vec![Text("Name"), Text("User Id")],
            vec![Text("Ann"), Text("6f1c2a52-3d0e-4c71-9a55-0c4b1f0e8a11")],
            vec![Text("Ben"), Text("not-a-uuid")],
        ],
    )]);
    let err = extractor.extract::<Member>().unwrap_err();
    match &err {
        ExtractError::ValueCoercion {
            row,
            column,
            field,
            source,
        } => {
            assert_eq!((*row, *column, *field), (3, 2, "user_id"));
            assert_eq!(source.target, "uuid");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(err.cell_position(), Some((3, 2)));
    assert_eq!(
        err.to_string(),
        "error setting field `user_id` from column 2 in row 3"
    );
}

#[test]
fn no_header_mode_binds_fields_by_position() {
    let extractor = Extractor::builder()
        .with_header(false)
        .from_bytes(workbook_bytes(&[SheetSpec::new(
            "Raw",
            vec![
                vec![Text("A-1"), Number(4.0), Bool(true)],
                vec![Text("B-2"), Text("9"), Text("no")],
            ],
        )]));
    let rows = extractor.extract::<Positional>().expect("extract rows");
    assert_eq!(
        rows,
        [
            Positional {
                code: "A-1".into(),
                quantity: 4,
                active: true,
                note: None,
            },
            Positional {
                code: "B-2".into(),
                quantity: 9,
                active: false,
                note: None,
            },
        ]
    );
}

#[test]
fn no_header_mode_does_not_need_binding_metadata() {
    let extractor = Extractor::builder()
        .with_header(false)
        .from_bytes(workbook_bytes(&[SheetSpec::new(
            "Raw",
            vec![vec![Text("x"), Number(2.0)]],
        )]));
    let rows = extractor.extract::<Unbound>().expect("extract rows");
    assert_eq!((rows[0].label.as_str(), rows[0].count), ("x", 2));
}

#[test]
fn no_header_mode_binds_from_the_first_used_column() {
    let extractor = Extractor::builder()
        .with_header(false)
        .from_bytes(workbook_bytes(&[SheetSpec::new(
            "Raw",
            vec![vec![Text("x"), Number(2.0)]],
        )
        .at(0, 2)]));
    let rows = extractor.extract::<Unbound>().expect("extract rows");
    assert_eq!(rows.len(), 1);
    assert_eq!((rows[0].label.as_str(), rows[0].count), ("x", 2));
}

#[test]
fn no_header_coercion_errors_name_the_sheet_column() {
    let err = Extractor::builder()
        .with_header(false)
        .from_bytes(workbook_bytes(&[SheetSpec::new(
            "Raw",
            vec![vec![Text("A-1"), Text("many")]],
        )
        .at(1, 2)]))
        .extract::<Positional>()
        .unwrap_err();
    match err {
        ExtractError::ValueCoercion {
            row, column, field, ..
        } => assert_eq!((row, column, field), (2, 4, "quantity")),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn tables_away_from_a1_use_absolute_ordinals() {
    let sheet = SheetSpec::new(
        "Offset",
        vec![
            vec![Text("Phone"), Text("Email")],
            vec![Text("555-0100"), Text("a@b.c")],
        ],
    )
    .at(2, 3);
    let extractor = from_sheets(&[sheet]);
    assert_eq!(
        extractor.header_index().unwrap().entries(),
        [(4, "Phone"), (5, "Email")]
    );
    let contacts = extractor.extract::<Contact>().expect("extract contacts");
    assert_eq!(contacts[0].phone, "555-0100");
    assert_eq!(contacts[0].email, "a@b.c");
}

#[test]
fn worksheets_are_selected_by_index_or_name() {
    let bytes = workbook_bytes(&[
        SheetSpec::new("Summary", vec![vec![Text("Total")]]),
        employee_sheet(vec![alice_row()]),
    ]);
    let by_index = Extractor::builder()
        .worksheet_index(2)
        .from_bytes(bytes.clone())
        .extract::<Employee>()
        .expect("by index");
    let by_name = Extractor::builder()
        .worksheet_name("Employees")
        .from_bytes(bytes.clone())
        .extract::<Employee>()
        .expect("by name");
    assert_eq!(by_index, by_name);
    assert_eq!(by_index.len(), 1);

    let names = Extractor::builder().from_bytes(bytes).worksheet_names().unwrap();
    assert_eq!(names, ["Summary", "Employees"]);
}

#[test]
fn unknown_worksheets_are_reported() {
    let bytes = workbook_bytes(&[employee_sheet(vec![alice_row()])]);
    let err = Extractor::builder()
        .worksheet_index(3)
        .from_bytes(bytes.clone())
        .extract::<Employee>()
        .unwrap_err();
    assert!(matches!(
        err,
        ExtractError::WorksheetIndexOutOfRange { index: 3, count: 1 }
    ));

    let err = Extractor::builder()
        .worksheet_index(0)
        .from_bytes(bytes.clone())
        .extract::<Employee>()
        .unwrap_err();
    assert!(matches!(err, ExtractError::WorksheetIndexOutOfRange { index: 0, .. }));

    let err = Extractor::builder()
        .worksheet_name("Payroll")
        .from_bytes(bytes)
        .extract::<Employee>()
        .unwrap_err();
    assert_eq!(err.to_string(), "worksheet 'Payroll' not found");
}

#[test]
fn empty_worksheet_yields_no_records() {
    let extractor = from_sheets(&[SheetSpec::new("Blank", Vec::new())]);
    assert!(extractor.extract::<Employee>().unwrap().is_empty());
    assert!(extractor.header_index().unwrap().is_empty());
}

#[test]
fn header_only_worksheet_yields_no_records() {
    let extractor = from_sheets(&[employee_sheet(Vec::new())]);
    assert!(extractor.extract::<Employee>().unwrap().is_empty());
}

#[test]
fn path_bytes_and_reader_sources_agree() {
    let workspace = TestWorkspace::new();
    let sheets = [employee_sheet(vec![alice_row()])];
    let path = workspace.write_workbook("employees.xlsx", &sheets);

    let from_path = Extractor::builder()
        .from_path(&path)
        .unwrap()
        .extract::<Employee>()
        .unwrap();
    let from_file = Extractor::builder()
        .from_reader(File::open(&path).unwrap())
        .unwrap()
        .extract::<Employee>()
        .unwrap();
    let from_cursor = Extractor::builder()
        .from_reader(Cursor::new(workbook_bytes(&sheets)))
        .unwrap()
        .extract::<Employee>()
        .unwrap();
    assert_eq!(from_path, from_file);
    assert_eq!(from_path, from_cursor);
}

#[test]
fn missing_and_empty_paths_are_rejected() {
    assert!(matches!(
        Extractor::builder().from_path(""),
        Err(ExtractError::Configuration(_))
    ));
    let workspace = TestWorkspace::new();
    let extractor = Extractor::builder()
        .from_path(workspace.path().join("missing.xlsx"))
        .unwrap();
    assert!(matches!(
        extractor.extract::<Employee>(),
        Err(ExtractError::UnreadableSource { .. })
    ));
}

#[test]
fn repeated_extractions_reuse_the_same_extractor() {
    let extractor = from_sheets(&[employee_sheet(vec![alice_row()])]);
    let first = extractor.extract::<Employee>().unwrap();
    let second = extractor.extract::<Employee>().unwrap();
    assert_eq!(first, second);
    assert_eq!(extractor.options().worksheet, SheetSelector::Index(1));
    assert_eq!(Employee::fields().len(), 5);
}

#[test]
fn manual_mapping_reads_cells_by_ordinal() {
    let extractor = from_sheets(&[employee_sheet(vec![
        alice_row(),
        vec![Text("Dan"), Number(40.0), Blank, date(2018, 2, 2), Blank],
    ])]);
    let summary = extractor
        .extract_with(|row| format!("{} ({})", row.text(1), row.text(2)))
        .unwrap();
    assert_eq!(summary, ["Alice (25)", "Dan (40)"]);

    let ages = extractor
        .try_extract_with(|row| row.get::<Option<u8>>(2))
        .unwrap();
    assert_eq!(ages, [Some(25), Some(40)]);
}

#[test]
fn manual_mapping_errors_carry_the_row_number() {
    let extractor = from_sheets(&[employee_sheet(vec![
        alice_row(),
        vec![Text("Eve"), Text("old"), Blank, date(2018, 2, 2), Blank],
    ])]);
    let err = extractor
        .try_extract_with(|row| row.get::<u8>(2))
        .unwrap_err();
    assert!(matches!(err, ExtractError::RowMapping { row: 3, .. }));
}
