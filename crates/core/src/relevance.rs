use std::collections::HashSet;

use crate::event::{IssueAction, IssueEvent, ISSUE_ENTITY};

/// Decides whether a webhook delivery represents an issue that just became
/// urgent and category-labelled, and therefore warrants paging the on-call
/// responder.
///
/// The urgent priority level and the relevant-label set are injected at
/// construction so the predicate stays pure and testable with arbitrary
/// configurations.
#[derive(Debug, Clone)]
pub struct RelevanceEngine {
    urgent_priority: u8,
    relevant_labels: HashSet<String>,
}

impl RelevanceEngine {
    /// Creates an engine that treats `urgent_priority` as the triggering
    /// severity and any label in `relevant_labels` as a notification
    /// precondition.
    pub fn new(urgent_priority: u8, relevant_labels: impl IntoIterator<Item = String>) -> Self {
        Self {
            urgent_priority,
            relevant_labels: relevant_labels.into_iter().collect(),
        }
    }

    /// Pure, total predicate over one delivery: `true` exactly when the
    /// notification should fire.
    ///
    /// Creates notify when the issue is already urgent and labelled at
    /// creation time. Updates notify only on the rising edge: the issue was
    /// not relevant under its prior effective state and is relevant now. An
    /// update without a change delta carries no transition information and
    /// evaluates to `false`; this is the conservative reading and matches
    /// the tracker's behaviour of always including `updatedFrom` on real
    /// field changes.
    pub fn is_relevant(&self, event: &IssueEvent) -> bool {
        if event.entity != ISSUE_ENTITY {
            return false;
        }

        let currently_relevant =
            self.relevant_state(event.data.priority, &event.data.label_ids);

        match event.action {
            IssueAction::Create => currently_relevant,
            IssueAction::Update => {
                let Some(delta) = &event.updated_from else {
                    return false;
                };
                // Unspecified delta fields did not change; fall back to the
                // current value.
                let prior_priority = delta.priority.unwrap_or(event.data.priority);
                let prior_labels = delta
                    .label_ids
                    .as_deref()
                    .unwrap_or(&event.data.label_ids);
                let was_relevant = self.relevant_state(prior_priority, prior_labels);
                !was_relevant && currently_relevant
            }
            IssueAction::Remove | IssueAction::Other => false,
        }
    }

    // Relevance is a conjunction evaluated once per state, never
    // field-by-field across states.
    fn relevant_state(&self, priority: u8, label_ids: &[String]) -> bool {
        priority == self.urgent_priority
            && label_ids
                .iter()
                .any(|label| self.relevant_labels.contains(label))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{ChangedFields, IssueState};

    const BUG: &str = "5b04a744-c7e8-4024-bc50-465cf1fb10f3";
    const QUESTION: &str = "4a1d862d-2f2e-4cf3-82c1-7c78257e2c7a";

    fn engine() -> RelevanceEngine {
        RelevanceEngine::new(1, [BUG.to_string(), QUESTION.to_string()])
    }

    fn labels(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|id| id.to_string()).collect()
    }

    fn state(priority: u8, label_ids: &[&str]) -> IssueState {
        IssueState {
            id: "issue-1".to_string(),
            title: "Test issue".to_string(),
            priority,
            label_ids: labels(label_ids),
        }
    }

    fn create_event(priority: u8, label_ids: &[&str]) -> IssueEvent {
        IssueEvent {
            action: IssueAction::Create,
            entity: ISSUE_ENTITY.to_string(),
            url: "https://tracker.example/issue/1".to_string(),
            data: state(priority, label_ids),
            updated_from: None,
        }
    }

    fn update_event(
        priority: u8,
        label_ids: &[&str],
        delta: Option<ChangedFields>,
    ) -> IssueEvent {
        IssueEvent {
            action: IssueAction::Update,
            entity: ISSUE_ENTITY.to_string(),
            url: "https://tracker.example/issue/1".to_string(),
            data: state(priority, label_ids),
            updated_from: delta,
        }
    }

    fn delta(priority: Option<u8>, label_ids: Option<&[&str]>) -> ChangedFields {
        ChangedFields {
            priority,
            label_ids: label_ids.map(labels),
        }
    }

    #[test]
    fn non_issue_entities_are_never_relevant() {
        let mut event = create_event(1, &[QUESTION]);
        event.entity = "Comment".to_string();
        assert!(!engine().is_relevant(&event));
    }

    #[test]
    fn create_with_urgent_priority_and_relevant_label_notifies() {
        assert!(engine().is_relevant(&create_event(1, &[QUESTION])));
        assert!(engine().is_relevant(&create_event(1, &[BUG, QUESTION])));
    }

    #[test]
    fn create_without_labels_does_not_notify() {
        assert!(!engine().is_relevant(&create_event(1, &[])));
    }

    #[test]
    fn create_with_only_irrelevant_labels_does_not_notify() {
        let event = create_event(1, &["deadbeef-cafe-bade-feed-cafedeadfeed"]);
        assert!(!engine().is_relevant(&event));
    }

    #[test]
    fn create_without_urgent_priority_does_not_notify() {
        assert!(!engine().is_relevant(&create_event(2, &[QUESTION])));
        assert!(!engine().is_relevant(&create_event(0, &[QUESTION])));
    }

    #[test]
    fn update_adding_relevant_label_notifies() {
        let event = update_event(1, &[QUESTION], Some(delta(Some(1), Some(&[]))));
        assert!(engine().is_relevant(&event));
    }

    #[test]
    fn update_adding_label_to_already_relevant_issue_does_not_renotify() {
        let event = update_event(1, &[BUG, QUESTION], Some(delta(None, Some(&[BUG]))));
        assert!(!engine().is_relevant(&event));
    }

    #[test]
    fn update_raising_priority_to_urgent_notifies() {
        let event = update_event(1, &[QUESTION], Some(delta(Some(2), None)));
        assert!(engine().is_relevant(&event));
    }

    #[test]
    fn update_dropping_urgent_priority_does_not_notify() {
        let event = update_event(2, &[QUESTION], Some(delta(Some(1), None)));
        assert!(!engine().is_relevant(&event));
    }

    #[test]
    fn update_removing_last_relevant_label_does_not_notify() {
        let event = update_event(1, &[], Some(delta(None, Some(&[QUESTION]))));
        assert!(!engine().is_relevant(&event));
    }

    #[test]
    fn update_becoming_relevant_through_multiple_changes_notifies() {
        // Priority and labels flip at once; the rising edge is evaluated over
        // the composed prior state, not per field.
        let event = update_event(1, &[QUESTION], Some(delta(Some(2), Some(&[]))));
        assert!(engine().is_relevant(&event));
    }

    #[test]
    fn update_with_partial_delta_falls_back_to_current_priority() {
        // Only the labels changed; urgency is treated as unchanged.
        let event = update_event(1, &[QUESTION], Some(delta(None, Some(&[]))));
        assert!(engine().is_relevant(&event));
    }

    #[test]
    fn update_with_empty_delta_never_notifies() {
        // Nothing changed, so prior state equals current state and the
        // rising-edge conjunction is (!x && x).
        let relevant = update_event(1, &[QUESTION], Some(ChangedFields::default()));
        assert!(!engine().is_relevant(&relevant));

        let irrelevant = update_event(2, &[], Some(ChangedFields::default()));
        assert!(!engine().is_relevant(&irrelevant));
    }

    #[test]
    fn update_without_delta_does_not_notify() {
        let event = update_event(1, &[QUESTION], None);
        assert!(!engine().is_relevant(&event));
    }

    #[test]
    fn update_swapping_one_relevant_label_for_another_does_not_renotify() {
        // Still urgent, still labelled; the reason for relevance changed but
        // there is no edge.
        let event = update_event(1, &[BUG], Some(delta(None, Some(&[QUESTION]))));
        assert!(!engine().is_relevant(&event));
    }

    #[test]
    fn update_between_non_urgent_priorities_does_not_notify() {
        let event = update_event(3, &[QUESTION], Some(delta(Some(2), None)));
        assert!(!engine().is_relevant(&event));
    }

    #[test]
    fn remove_and_unknown_actions_are_ignored() {
        let mut event = create_event(1, &[QUESTION]);
        event.action = IssueAction::Remove;
        assert!(!engine().is_relevant(&event));

        event.action = IssueAction::Other;
        assert!(!engine().is_relevant(&event));
    }

    #[test]
    fn engine_honours_injected_configuration() {
        let custom = RelevanceEngine::new(3, ["ops".to_string()]);
        let mut event = create_event(3, &["ops"]);
        assert!(custom.is_relevant(&event));

        event.data.priority = 1;
        assert!(!custom.is_relevant(&event));
    }
}
