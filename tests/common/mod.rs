//! Shared fixtures for the workflow integration tests
#![allow(dead_code)]

use statportal_workflow::{
    Actor, InMemoryWorkflowStore, StatusCatalog, StatusField, TableBinding, WorkflowEngine,
};

pub const GDP_TABLE: &str = "gdp_quarterly";
pub const MAKER: i64 = 100;
pub const CHECKER: i64 = 200;
pub const HEAD: i64 = 300;
pub const ADMIN: i64 = 1;

/// Business row with a workflow status column
#[derive(Debug, Clone, PartialEq)]
pub struct LabourSurvey {
    pub labour_survey_id: i64,
    pub workflow_status_id: i32,
}

impl StatusField for LabourSurvey {
    const TABLE: &'static str = "labour_survey";
    const KEY_COLUMN: &'static str = "labour_survey_id";

    fn record_id(&self) -> i64 {
        self.labour_survey_id
    }

    fn status_id(&self) -> i32 {
        self.workflow_status_id
    }

    fn set_status_id(&mut self, status_id: i32) {
        self.workflow_status_id = status_id;
    }
}

/// Engine over an in-memory store with `gdp_quarterly` registered and
/// records 1..=3 at Maker Entry
pub fn engine() -> WorkflowEngine<InMemoryWorkflowStore> {
    let store = InMemoryWorkflowStore::new();
    store.register_table(
        TableBinding::new(GDP_TABLE, "gdp_quarterly_id", "workflow_status_id")
            .expect("valid binding"),
    );
    for record_id in 1..=3 {
        store
            .insert_record(GDP_TABLE, record_id, 1)
            .expect("registered table");
    }
    WorkflowEngine::new(store, StatusCatalog::canonical())
}

pub fn admin() -> Actor {
    Actor::administrator(ADMIN)
}

pub fn maker() -> Actor {
    Actor::user(MAKER)
}
