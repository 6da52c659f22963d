// State machine module for the maker-checker-approver workflow
//
// The status graph is fixed: states, actions and the transition table are
// plain data, shared by record-level and screen-level workflows.

pub mod actions;
pub mod states;
pub mod transitions;

pub use actions::WorkflowAction;
pub use states::{VisualStage, WorkflowState};
pub use transitions::{
    available_actions, plan_transition, rule_for, PlannedTransition, TransitionRule,
    TRANSITION_TABLE,
};
