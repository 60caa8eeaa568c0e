//! Shared project fixtures for `normkit-core` integration tests: a linear
//! FK chain, a cyclic pair for negative validation tests, and an
//! appendable trio for union-mode tests.

use normkit_core::project::{EntityConfig, EntityType, ExtraColumnsConfig, ForeignKeyConfig, ForeignKeyConstraints, JoinType, Project};

/// `region -> site -> sensor`, a three-entity linear foreign-key chain.
/// Every entity is `type = fixed` so it can be driven through a
/// `FixedLoader` without a real data source.
pub fn linear_chain_project() -> Project {
    let mut project = Project::default();

    let region = EntityConfig {
        entity_type: EntityType::Fixed,
        columns: vec!["name".into()],
        values: Some(vec![
            vec![serde_json::json!("north")],
            vec![serde_json::json!("south")],
        ]),
        public_id: Some("region_id".into()),
        ..Default::default()
    };
    project.entities.insert("region".to_string(), region);

    let mut site = EntityConfig {
        entity_type: EntityType::Fixed,
        columns: vec!["code".into(), "region_ref".into()],
        values: Some(vec![
            vec![serde_json::json!("site-a"), serde_json::json!("north")],
            vec![serde_json::json!("site-b"), serde_json::json!("south")],
        ]),
        public_id: Some("site_id".into()),
        ..Default::default()
    };
    site.keys = vec!["code".into()];
    site.foreign_keys.push(ForeignKeyConfig {
        remote_entity: "region".into(),
        local_keys: vec!["region_ref".into()],
        remote_keys: vec!["name".into()],
        how: JoinType::Inner,
        extra_columns: ExtraColumnsConfig::Empty,
        drop_remote_id: false,
        constraints: ForeignKeyConstraints::default(),
    });
    project.entities.insert("site".to_string(), site);

    let mut sensor = EntityConfig {
        entity_type: EntityType::Fixed,
        columns: vec!["serial".into(), "site_ref".into()],
        values: Some(vec![
            vec![serde_json::json!("sn-1"), serde_json::json!("site-a")],
            vec![serde_json::json!("sn-2"), serde_json::json!("site-b")],
        ]),
        public_id: Some("sensor_id".into()),
        ..Default::default()
    };
    sensor.keys = vec!["serial".into()];
    sensor.foreign_keys.push(ForeignKeyConfig {
        remote_entity: "site".into(),
        local_keys: vec!["site_ref".into()],
        remote_keys: vec!["code".into()],
        how: JoinType::Inner,
        extra_columns: ExtraColumnsConfig::Empty,
        drop_remote_id: false,
        constraints: ForeignKeyConstraints::default(),
    });
    project.entities.insert("sensor".to_string(), sensor);

    project
}

/// `employee.manager_ref -> employee` (self-reference) plus
/// `department.head_ref -> employee`, forming a cycle through the
/// `department <-> employee` pair once both foreign keys are followed —
/// used to exercise the acyclicity check.
pub fn cyclic_pair_project() -> Project {
    let mut project = Project::default();

    let mut employee = EntityConfig {
        entity_type: EntityType::Fixed,
        columns: vec!["name".into(), "department_ref".into()],
        values: Some(vec![vec![serde_json::json!("ada"), serde_json::json!("eng")]]),
        public_id: Some("employee_id".into()),
        ..Default::default()
    };
    employee.keys = vec!["name".into()];
    employee.foreign_keys.push(ForeignKeyConfig {
        remote_entity: "department".into(),
        local_keys: vec!["department_ref".into()],
        remote_keys: vec!["code".into()],
        how: JoinType::Inner,
        extra_columns: ExtraColumnsConfig::Empty,
        drop_remote_id: false,
        constraints: ForeignKeyConstraints::default(),
    });
    project.entities.insert("employee".to_string(), employee);

    let mut department = EntityConfig {
        entity_type: EntityType::Fixed,
        columns: vec!["code".into(), "head_ref".into()],
        values: Some(vec![vec![serde_json::json!("eng"), serde_json::json!("ada")]]),
        public_id: Some("department_id".into()),
        ..Default::default()
    };
    department.keys = vec!["code".into()];
    department.foreign_keys.push(ForeignKeyConfig {
        remote_entity: "employee".into(),
        local_keys: vec!["head_ref".into()],
        remote_keys: vec!["name".into()],
        how: JoinType::Inner,
        extra_columns: ExtraColumnsConfig::Empty,
        drop_remote_id: false,
        constraints: ForeignKeyConstraints::default(),
    });
    project.entities.insert("department".to_string(), department);

    project
}

/// Three independently-sourced entities unionable into a single `contact`
/// entity via `append`, used to exercise append/union handling.
pub fn unionable_trio_project() -> Project {
    let mut project = Project::default();

    project.entities.insert(
        "contacts_a".to_string(),
        EntityConfig {
            entity_type: EntityType::Fixed,
            columns: vec!["email".into()],
            values: Some(vec![vec![serde_json::json!("a@example.com")]]),
            ..Default::default()
        },
    );
    project.entities.insert(
        "contacts_b".to_string(),
        EntityConfig {
            entity_type: EntityType::Fixed,
            columns: vec!["email".into()],
            values: Some(vec![vec![serde_json::json!("b@example.com")]]),
            ..Default::default()
        },
    );
    project.entities.insert(
        "contacts_c".to_string(),
        EntityConfig {
            entity_type: EntityType::Fixed,
            columns: vec!["email".into()],
            values: Some(vec![vec![serde_json::json!("c@example.com")]]),
            ..Default::default()
        },
    );

    let mut contact = EntityConfig {
        entity_type: EntityType::Entity,
        source: Some("contacts_a".into()),
        columns: vec!["email".into()],
        public_id: Some("contact_id".into()),
        ..Default::default()
    };
    contact.append.push(normkit_core::project::AppendItem {
        source: Some("contacts_b".into()),
        ..Default::default()
    });
    contact.append.push(normkit_core::project::AppendItem {
        source: Some("contacts_c".into()),
        ..Default::default()
    });
    project.entities.insert("contact".to_string(), contact);

    project
}
