//! CFTask admission.

use async_trait::async_trait;

use crate::coordination::RequestContext;
use crate::crd::{CFTask, TASK_FAILED_CONDITION, TASK_SUCCEEDED_CONDITION, is_condition_true};
use crate::webhooks::error::ValidationError;
use crate::webhooks::validator::AdmissionValidator;

pub const CANCELATION_NOT_POSSIBLE_ERROR: &str = "CancelationNotPossibleError";

fn sequence_id(task: &CFTask) -> i64 {
    task.status.as_ref().map(|s| s.sequence_id).unwrap_or_default()
}

fn has_finished(task: &CFTask) -> bool {
    task.status.as_ref().is_some_and(|s| {
        is_condition_true(&s.conditions, TASK_SUCCEEDED_CONDITION)
            || is_condition_true(&s.conditions, TASK_FAILED_CONDITION)
    })
}

#[derive(Default)]
pub struct CFTaskValidator;

impl CFTaskValidator {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AdmissionValidator<CFTask> for CFTaskValidator {
    async fn validate_create(&self, _ctx: &RequestContext, task: &CFTask) -> Result<(), ValidationError> {
        if task.spec.command.is_empty() {
            return Err(ValidationError::missing_required_field("Spec.Command"));
        }
        if task.spec.app_ref.name.is_empty() {
            return Err(ValidationError::missing_required_field("Spec.AppRef.Name"));
        }
        if sequence_id(task) < 0 {
            return Err(ValidationError::invalid_field_value(
                "SequenceID cannot be negative",
            ));
        }
        Ok(())
    }

    async fn validate_update(
        &self,
        _ctx: &RequestContext,
        old: &CFTask,
        new: &CFTask,
    ) -> Result<(), ValidationError> {
        if !old.spec.canceled && new.spec.canceled && has_finished(old) {
            return Err(ValidationError::new(
                CANCELATION_NOT_POSSIBLE_ERROR,
                format!(
                    "Task with name '{}' cannot be canceled as it has already completed",
                    old.metadata.name.as_deref().unwrap_or_default()
                ),
            ));
        }

        if sequence_id(old) != sequence_id(new) {
            return Err(ValidationError::field_is_immutable("SequenceID"));
        }

        Ok(())
    }
}
