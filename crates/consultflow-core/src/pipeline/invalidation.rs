use tracing::info;

use super::state::{SessionState, Stage};

/// Clears every output downstream of `stage` and returns the stages that
/// actually lost content.
pub(crate) fn invalidate_downstream(state: &mut SessionState, stage: Stage) -> Vec<Stage> {
    let cleared = stage
        .downstream()
        .filter(|downstream| state.has_output(*downstream))
        .collect::<Vec<_>>();
    for downstream in stage.downstream() {
        state.clear_output(downstream);
    }
    if !cleared.is_empty() {
        let names = cleared
            .iter()
            .map(|stage| stage.as_str())
            .collect::<Vec<_>>()
            .join(",");
        info!(stage = stage.as_str(), cleared = %names, "downstream outputs invalidated");
    }
    cleared
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SearchBundle;
    use crate::pipeline::PipelinePhase;

    fn full_state() -> SessionState {
        let mut state = SessionState::new();
        state.internal_text = "Q1 revenue up 5%".to_string();
        state.internal_summary = Some("summary".to_string());
        state.query_candidates = Some(vec!["a".to_string()]);
        state.executed_queries = Some(vec!["a".to_string()]);
        state.search_bundle = Some(SearchBundle::without_search("doc"));
        state.issues = Some("issues".to_string());
        state.proposals = Some("proposals".to_string());
        state.review = Some("review".to_string());
        state.slide_outline = Some("# Slides".to_string());
        state
    }

    #[test]
    fn every_stage_clears_exactly_its_downstream() {
        for stage in Stage::ALL {
            let mut state = full_state();
            let cleared = invalidate_downstream(&mut state, stage);
            assert_eq!(cleared, stage.downstream().collect::<Vec<_>>());
            for other in Stage::ALL {
                assert_eq!(state.has_output(other), other <= stage, "{stage} -> {other}");
            }
            assert!(state.outputs_form_prefix());
            assert_eq!(state.internal_text, "Q1 revenue up 5%");
        }
    }

    #[test]
    fn search_invalidation_drops_executed_queries_with_bundle() {
        let mut state = full_state();
        invalidate_downstream(&mut state, Stage::SuggestQueries);
        assert!(state.executed_queries.is_none());
        assert!(state.search_bundle.is_none());
    }

    #[test]
    fn cleared_list_skips_stages_that_were_already_empty() {
        let mut state = full_state();
        state.review = None;
        state.slide_outline = None;
        let cleared = invalidate_downstream(&mut state, Stage::ExtractIssues);
        assert_eq!(cleared, vec![Stage::Propose]);
    }

    #[test]
    fn phase_tracks_longest_present_prefix() {
        let mut state = SessionState::new();
        assert_eq!(state.phase(), PipelinePhase::Empty);
        state.internal_summary = Some("s".to_string());
        assert_eq!(state.phase(), PipelinePhase::InternalSummarized);
        let state = full_state();
        assert_eq!(state.phase(), PipelinePhase::SlidesBuilt);
    }
}
