//! End-to-end scenarios exercising the public `normalize()` API.

use normkit_core::error::NormError;
use normkit_core::loader::FixedLoader;
use normkit_core::orchestrator::normalize;
use normkit_core::project::{
    AppendItem, Cardinality, EntityConfig, EntityType, ExtraColumnsConfig, ForeignKeyConfig, ForeignKeyConstraints,
    JoinType, Project, UnnestConfig,
};
use normkit_core::value::Value;

fn fixed(columns: &[&str], values: Vec<Vec<serde_json::Value>>) -> EntityConfig {
    EntityConfig {
        entity_type: EntityType::Fixed,
        columns: columns.iter().map(|s| s.to_string()).collect(),
        values: Some(values),
        ..Default::default()
    }
}

#[test]
fn scenario_a_linear_fk_chain() {
    let mut project = Project::default();

    let mut a = fixed(&["name"], vec![vec![serde_json::json!("x")], vec![serde_json::json!("y")]]);
    a.public_id = Some("a_id".into());
    project.entities.insert("A".to_string(), a);

    let mut b = fixed(&["ref"], vec![vec![serde_json::json!("x")], vec![serde_json::json!("x")]]);
    b.public_id = Some("b_id".into());
    b.keys = vec!["ref".into()];
    b.foreign_keys.push(ForeignKeyConfig {
        remote_entity: "A".into(),
        local_keys: vec!["ref".into()],
        remote_keys: vec!["name".into()],
        how: JoinType::Inner,
        extra_columns: ExtraColumnsConfig::Empty,
        drop_remote_id: false,
        constraints: ForeignKeyConstraints::default(),
    });
    project.entities.insert("B".to_string(), b);

    let outcome = normalize(&project, &["B".to_string()], &FixedLoader).unwrap();
    let b = outcome.tables.get("B").unwrap();
    assert_eq!(b.len(), 2);
    assert!(b.has_column("a_id"));
    assert_eq!(b.get(0, "a_id"), Value::Int(1));
    assert_eq!(b.get(1, "a_id"), Value::Int(1));
}

#[test]
fn scenario_b_duplicate_column_rename_hazard() {
    let mut project = Project::default();

    let mut parent = fixed(
        &["pid", "name"],
        vec![vec![serde_json::json!("raw-1"), serde_json::json!("x")]],
    );
    parent.public_id = Some("pid".into());
    project.entities.insert("P".to_string(), parent);

    let mut child = fixed(&["ref"], vec![vec![serde_json::json!("x")]]);
    child.keys = vec!["ref".into()];
    child.foreign_keys.push(ForeignKeyConfig {
        remote_entity: "P".into(),
        local_keys: vec!["ref".into()],
        remote_keys: vec!["name".into()],
        how: JoinType::Inner,
        extra_columns: ExtraColumnsConfig::Empty,
        drop_remote_id: false,
        constraints: ForeignKeyConstraints::default(),
    });
    project.entities.insert("C".to_string(), child);

    let outcome = normalize(&project, &["C".to_string()], &FixedLoader).unwrap();
    let c = outcome.tables.get("C").unwrap();
    assert_eq!(c.columns().iter().filter(|col| *col == "pid").count(), 1);
    assert_eq!(c.get(0, "pid"), Value::Int(1));
}

#[test]
fn scenario_c_unpivot_then_link_deferral() {
    let mut project = Project::default();

    let mut l = fixed(
        &["site_id", "Ort", "Kreis", "Land"],
        vec![vec![
            serde_json::json!("s1"),
            serde_json::json!("ort-a"),
            serde_json::json!("kreis-a"),
            serde_json::json!("land-a"),
        ]],
    );
    l.unnest = Some(UnnestConfig {
        id_vars: vec!["site_id".into()],
        value_vars: vec!["Ort".into(), "Kreis".into(), "Land".into()],
        var_name: "type".into(),
        value_name: "name".into(),
    });
    l.foreign_keys.push(ForeignKeyConfig {
        remote_entity: "T".into(),
        local_keys: vec!["type".into(), "name".into()],
        remote_keys: vec!["type".into(), "name".into()],
        how: JoinType::Inner,
        extra_columns: ExtraColumnsConfig::Empty,
        drop_remote_id: false,
        constraints: ForeignKeyConstraints::default(),
    });
    project.entities.insert("L".to_string(), l);

    let mut t = fixed(
        &["type", "name"],
        vec![
            vec![serde_json::json!("Ort"), serde_json::json!("ort-a")],
            vec![serde_json::json!("Kreis"), serde_json::json!("kreis-a")],
            vec![serde_json::json!("Land"), serde_json::json!("land-a")],
        ],
    );
    t.public_id = Some("t_id".into());
    project.entities.insert("T".to_string(), t);

    let outcome = normalize(&project, &["L".to_string()], &FixedLoader).unwrap();
    let l = outcome.tables.get("L").unwrap();
    assert_eq!(l.len(), 3);
    assert!(l.has_column("t_id"));
    assert!(l.rows().iter().all(|r| r.get("t_id").map(|v| !v.is_null()).unwrap_or(false)));
}

#[test]
fn scenario_d_cardinality_violation() {
    let mut project = Project::default();

    let parent = fixed(
        &["name"],
        vec![vec![serde_json::json!("x")], vec![serde_json::json!("x")]],
    );
    project.entities.insert("P".to_string(), parent);

    let mut child = fixed(&["ref"], vec![vec![serde_json::json!("x")]]);
    child.keys = vec!["ref".into()];
    let mut fk = ForeignKeyConfig {
        remote_entity: "P".into(),
        local_keys: vec!["ref".into()],
        remote_keys: vec!["name".into()],
        how: JoinType::Inner,
        extra_columns: ExtraColumnsConfig::Empty,
        drop_remote_id: false,
        constraints: ForeignKeyConstraints::default(),
    };
    fk.constraints.cardinality = Some(Cardinality::ManyToOne);
    fk.constraints.require_unique_right = true;
    child.foreign_keys.push(fk);
    project.entities.insert("C".to_string(), child);

    let err = normalize(&project, &["C".to_string()], &FixedLoader).unwrap_err();
    match err {
        NormError::ConstraintViolation { reason, .. } => {
            assert!(reason.contains("duplicate right key(s)"), "unexpected reason: {reason}");
        }
        other => panic!("expected ConstraintViolation, got {other:?}"),
    }
}

#[test]
fn scenario_e_append_with_distinct_mode() {
    let mut project = Project::default();

    let mut s = fixed(
        &["name"],
        vec![
            vec![serde_json::json!("A")],
            vec![serde_json::json!("B")],
            vec![serde_json::json!("C")],
        ],
    );
    s.append_mode = "distinct".to_string();
    s.append.push(AppendItem {
        r#type: Some(EntityType::Fixed),
        values: Some(vec![vec![serde_json::json!("A")]]),
        columns: Some(vec!["name".into()]),
        ..Default::default()
    });
    project.entities.insert("S".to_string(), s);

    let outcome = normalize(&project, &["S".to_string()], &FixedLoader).unwrap();
    let s = outcome.tables.get("S").unwrap();
    assert_eq!(s.len(), 3);
    let mut names: Vec<String> = s.rows().iter().map(|r| r.get("name").unwrap().to_string()).collect();
    names.sort();
    assert_eq!(names, vec!["A".to_string(), "B".to_string(), "C".to_string()]);
}

#[test]
fn scenario_f_cycle_in_configuration() {
    let mut project = Project::default();
    project.entities.insert(
        "A".to_string(),
        EntityConfig {
            depends_on: vec!["B".into()],
            ..Default::default()
        },
    );
    project.entities.insert(
        "B".to_string(),
        EntityConfig {
            depends_on: vec!["A".into()],
            ..Default::default()
        },
    );

    let err = normalize(&project, &["A".to_string()], &FixedLoader).unwrap_err();
    assert!(matches!(err, NormError::Config { .. }));
}
