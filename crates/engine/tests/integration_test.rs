//! Engine integration tests.
//!
//! These exercise the layers together the way an application would:
//! model definition with hooks and inheritance, association graphs
//! spanning several models, and query behavior over live stores.

use proptest::prelude::*;
use relata_core::{attrs, RelataError, Value};
use relata_engine::schema::ModelDef;
use relata_engine::{Database, Filters};

// =============================================================================
// After-create hooks
// =============================================================================

fn timestamped() -> ModelDef {
    ModelDef::builder("Timestamped")
        .attribute("created_at")
        .after_create_named("stamp_created_at", |record| {
            record.set("created_at", chrono::Utc::now())
        })
        .build()
}

#[test]
fn named_hook_runs_on_create() {
    let db = Database::new();
    let children = db
        .define(
            ModelDef::builder("Child")
                .attribute("name")
                .after_create_named("name_child", |record| record.set("name", "Alice"))
                .build(),
        )
        .unwrap();

    let child = children.create(attrs! {}).unwrap();
    assert_eq!(child.get("name").unwrap(), Value::from("Alice"));
}

#[test]
fn inline_hook_runs_on_create() {
    let db = Database::new();
    let dogs = db
        .define(
            ModelDef::builder("Dog")
                .attribute("sound")
                .after_create(|record| record.set("sound", "bark"))
                .build(),
        )
        .unwrap();

    let dog = dogs.create(attrs! {}).unwrap();
    assert_eq!(dog.get("sound").unwrap(), Value::from("bark"));
}

#[test]
fn inherited_hook_runs_for_descendant_creations() {
    let db = Database::new();
    let base = timestamped();
    let parents = db
        .define(ModelDef::builder("Parent").extends(&base).build())
        .unwrap();

    let parent = parents.create(attrs! {}).unwrap();
    assert!(parent.get("created_at").unwrap().as_time().is_some());
}

#[test]
fn hooks_run_in_definition_order() {
    let db = Database::new();
    let logs = db
        .define(
            ModelDef::builder("Log")
                .attribute("trace")
                .after_create(|record| record.set("trace", "first"))
                .after_create(|record| {
                    let so_far = record.get("trace").unwrap();
                    record.set("trace", format!("{so_far},second"))
                })
                .build(),
        )
        .unwrap();

    let log = logs.create(attrs! {}).unwrap();
    assert_eq!(log.get("trace").unwrap(), Value::from("first,second"));
}

#[test]
fn hook_failure_propagates_but_record_stays_inserted() {
    let db = Database::new();
    let jobs = db
        .define(
            ModelDef::builder("Job")
                .after_create_named("reject", |record| {
                    Err(RelataError::FrozenRecord {
                        model: record.model_name().to_string(),
                        id: record.id(),
                    })
                })
                .build(),
        )
        .unwrap();

    let err = jobs.create(attrs! {}).unwrap_err();
    assert!(matches!(err, RelataError::Hook { .. }));
    // Hooks run after insertion; the failure does not roll it back.
    assert_eq!(jobs.count(), 1);
}

// =============================================================================
// Association graph scenarios
// =============================================================================

fn define_family(db: &Database) {
    let base = timestamped();
    db.define(
        ModelDef::builder("Parent")
            .extends(&base)
            .has_many("children", "Child", "parent_id")
            .has_many_through("dogs", "Dog", "children", "dogs")
            .build(),
    )
    .unwrap();
    db.define(
        ModelDef::builder("Child")
            .extends(&base)
            .attribute("name")
            .belongs_to("parent", "Parent", "parent_id")
            .has_many("dogs", "Dog", "child_id")
            .after_create_named("name_child", |record| record.set("name", "Alice"))
            .build(),
    )
    .unwrap();
    db.define(
        ModelDef::builder("Dog")
            .attribute("breed")
            .belongs_to("child", "Child", "child_id")
            .build(),
    )
    .unwrap();
}

#[test]
fn grandparent_reaches_dogs_through_children() {
    let db = Database::new();
    define_family(&db);
    let parents = db.model("Parent").unwrap();

    let parent = parents.create(attrs! {}).unwrap();
    let child = parent.create_related("children", attrs! {}).unwrap();
    let dog = child
        .create_related("dogs", attrs! { "breed" => "mutt" })
        .unwrap();

    assert_eq!(parent.related("dogs").unwrap().first(), Some(&dog));
    assert_eq!(parent.related_ids("dogs").unwrap(), vec![dog.id()]);
    assert_eq!(
        parent.related("dogs").unwrap()[0].get("breed").unwrap(),
        Value::from("mutt")
    );
    // Inherited and own hooks both ran on the intermediate.
    assert_eq!(child.get("name").unwrap(), Value::from("Alice"));
    assert!(child.get("created_at").unwrap().as_time().is_some());
}

#[test]
fn join_model_mediates_many_to_many() {
    let db = Database::new();
    db.define(
        ModelDef::builder("Patient")
            .has_many("appointments", "Appointment", "patient_id")
            .has_many_through("doctors", "Doctor", "appointments", "doctor")
            .build(),
    )
    .unwrap();
    db.define(
        ModelDef::builder("Doctor")
            .has_many("appointments", "Appointment", "doctor_id")
            .has_many_through("patients", "Patient", "appointments", "patient")
            .build(),
    )
    .unwrap();
    db.define(
        ModelDef::builder("Appointment")
            .belongs_to("patient", "Patient", "patient_id")
            .belongs_to("doctor", "Doctor", "doctor_id")
            .build(),
    )
    .unwrap();

    let patient = db.model("Patient").unwrap().create(attrs! {}).unwrap();
    let doctor = db.model("Doctor").unwrap().create(attrs! {}).unwrap();
    let appointment = db
        .model("Appointment")
        .unwrap()
        .create(attrs! { "patient" => patient.id(), "doctor" => doctor.id() })
        .unwrap();

    assert_eq!(appointment.related_one("doctor").unwrap(), Some(doctor.clone()));
    assert_eq!(appointment.related_one("patient").unwrap(), Some(patient.clone()));
    assert_eq!(patient.related("doctors").unwrap(), vec![doctor.clone()]);
    assert_eq!(doctor.related("patients").unwrap(), vec![patient]);
}

#[test]
fn drop_all_resets_every_model_in_the_graph() {
    let db = Database::new();
    define_family(&db);
    let parents = db.model("Parent").unwrap();
    let parent = parents.create(attrs! {}).unwrap();
    parent
        .create_related("dogs", attrs! { "breed" => "mutt" })
        .unwrap();
    assert!(db.total_records() > 0);

    db.drop_all();
    assert_eq!(db.total_records(), 0);
    assert_eq!(db.model("Parent").unwrap().count(), 0);
    assert_eq!(db.model("Child").unwrap().count(), 0);
    assert_eq!(db.model("Dog").unwrap().count(), 0);
}

// =============================================================================
// Query behavior over live stores
// =============================================================================

#[test]
fn query_reflects_mutations_between_evaluations() {
    let db = Database::new();
    define_family(&db);
    let dogs = db.model("Dog").unwrap();
    let mutts = dogs.filter(Filters::new().eq("breed", "mutt"));

    assert_eq!(mutts.count(), 0);
    let rex = dogs.create(attrs! { "breed" => "mutt" }).unwrap();
    assert_eq!(mutts.count(), 1);
    rex.destroy().unwrap();
    assert_eq!(mutts.count(), 0);
}

proptest! {
    /// Exclusion is the exact complement of the matching filter, whatever
    /// the store contents.
    #[test]
    fn exclusion_partitions_the_store(
        values in proptest::collection::vec(0i64..5, 0..24),
        probe in 0i64..5,
    ) {
        let db = Database::new();
        let items = db
            .define(ModelDef::builder("Item").attribute("x").build())
            .unwrap();
        for v in &values {
            items.create(attrs! { "x" => *v }).unwrap();
        }

        let matched = items.filter(Filters::new().eq("x", probe)).all();
        let complement = items.exclude(Filters::new().eq("x", probe)).all();

        prop_assert_eq!(matched.len() + complement.len(), values.len());
        for record in &matched {
            prop_assert_eq!(record.get("x").unwrap(), Value::Int(probe));
        }
        for record in &complement {
            prop_assert!(!matched.contains(record));
        }
    }
}
