//! Week timeline and column reindexing
//!
//! Week numbers are position labels, not identities: the active weeks are
//! always `1..=N`. Inserting or removing a column renumbers everything after
//! it, and every plan row must follow the same renumbering or rows drift onto
//! different week domains.
//!
//! Each edit builds one [`WeekMapping`] (for every new week, the old week its
//! value comes from) and applies it to all plans in a single pass. Applying a
//! mapping always yields a dense collection, one entry per active week, so a
//! plan that was missing an intermediate week gets an explicit zero instead of
//! a hole.
//!
//! ```text
//! insert at position 2 into [1,2,3]       remove week 2 from [1,2,3,4]
//!   new week:   1  2  3  4                  new week:   1  2  3
//!   copied from 1  2  -  3                  copied from 1  3  4
//! ```

use resplan_core::{
    Allocation, ResourcePlan, TimelineError, WeekNumber, WeeklyAllocation, MAX_WEEKS,
};
use tracing::{debug, instrument, warn};

/// The ordered, dense, 1-based week sequence shared by all plans
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WeekTimeline {
    count: u32,
}

/// Result of a structural edit: the new timeline and a replacement plan list
/// for the caller to adopt
#[derive(Clone, Debug, PartialEq)]
pub struct TimelineEdit {
    pub timeline: WeekTimeline,
    pub plans: Vec<ResourcePlan>,
}

impl WeekTimeline {
    /// Timeline of `count` weeks, held within `1..=MAX_WEEKS`
    pub fn new(count: u32) -> Self {
        Self {
            count: count.clamp(1, MAX_WEEKS),
        }
    }

    pub fn week_count(&self) -> u32 {
        self.count
    }

    /// Active week numbers in order
    pub fn weeks(&self) -> impl Iterator<Item = WeekNumber> + '_ {
        1..=self.count
    }

    pub fn to_vec(&self) -> Vec<WeekNumber> {
        self.weeks().collect()
    }

    pub fn contains(&self, week: WeekNumber) -> bool {
        (1..=self.count).contains(&week)
    }

    /// Insert a zero week at `position` (0 = before week 1, N = after the
    /// last week). The new week is numbered `position + 1`.
    #[instrument(skip(self, plans), fields(weeks = self.count, plans = plans.len()))]
    pub fn insert_week_at(
        &self,
        position: u32,
        plans: &[ResourcePlan],
    ) -> Result<TimelineEdit, TimelineError> {
        if position > self.count {
            return Err(TimelineError::PositionOutOfRange {
                position,
                len: self.count,
            });
        }
        if self.count >= MAX_WEEKS {
            return Err(TimelineError::TimelineFull(MAX_WEEKS));
        }

        let mapping = WeekMapping::insertion(self.count, position);
        debug!(new_week = position + 1, "inserting week");
        Ok(self.apply(mapping, plans))
    }

    /// Remove `week` and shift every later week down by one.
    ///
    /// Declined when the week does not exist or is the only one left.
    #[instrument(skip(self, plans), fields(weeks = self.count, plans = plans.len()))]
    pub fn remove_week(
        &self,
        week: WeekNumber,
        plans: &[ResourcePlan],
    ) -> Result<TimelineEdit, TimelineError> {
        if !self.contains(week) {
            return Err(TimelineError::UnknownWeek {
                week,
                len: self.count,
            });
        }
        if self.count == 1 {
            return Err(TimelineError::LastWeek(week));
        }

        let mapping = WeekMapping::removal(self.count, week);
        debug!("removing week");
        Ok(self.apply(mapping, plans))
    }

    /// Add a zero week after the last one
    pub fn append_week(&self, plans: &[ResourcePlan]) -> Result<TimelineEdit, TimelineError> {
        self.insert_week_at(self.count, plans)
    }

    /// Fit a plan onto this timeline without renumbering: weeks past the end
    /// are dropped and missing weeks become explicit zeros
    pub fn reconcile(&self, plan: &ResourcePlan) -> ResourcePlan {
        let outside = plan
            .weekly_allocations
            .iter()
            .filter(|wa| !self.contains(wa.week_number))
            .count();
        if outside > 0 {
            warn!(
                plan = %plan.id,
                dropped = outside,
                weeks = self.count,
                "dropping allocations outside the timeline"
            );
        }
        WeekMapping::identity(self.count).apply(plan)
    }

    fn apply(&self, mapping: WeekMapping, plans: &[ResourcePlan]) -> TimelineEdit {
        let plans = plans.iter().map(|plan| mapping.apply(plan)).collect();
        TimelineEdit {
            timeline: WeekTimeline::new(mapping.week_count()),
            plans,
        }
    }
}

impl Default for WeekTimeline {
    fn default() -> Self {
        Self::new(1)
    }
}

/// For each new week (index 0 = week 1), the old week it takes its value
/// from, or `None` for a freshly inserted zero week
#[derive(Clone, Debug, PartialEq, Eq)]
struct WeekMapping {
    sources: Vec<Option<WeekNumber>>,
}

impl WeekMapping {
    fn identity(count: u32) -> Self {
        Self {
            sources: (1..=count).map(Some).collect(),
        }
    }

    fn insertion(count: u32, position: u32) -> Self {
        let sources = (1..=position)
            .map(Some)
            .chain(std::iter::once(None))
            .chain((position + 1..=count).map(Some))
            .collect();
        Self { sources }
    }

    fn removal(count: u32, removed: WeekNumber) -> Self {
        Self {
            sources: (1..=count).filter(|w| *w != removed).map(Some).collect(),
        }
    }

    fn week_count(&self) -> u32 {
        self.sources.len() as u32
    }

    fn apply(&self, plan: &ResourcePlan) -> ResourcePlan {
        let old = plan.allocation_map();
        let weekly_allocations = self
            .sources
            .iter()
            .zip(1..)
            .map(|(source, week)| {
                let allocation = source
                    .and_then(|w| old.get(&w).copied())
                    .unwrap_or(Allocation::ZERO);
                WeeklyAllocation::new(week, allocation)
            })
            .collect();
        ResourcePlan {
            weekly_allocations,
            ..plan.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn percents(plan: &ResourcePlan) -> Vec<(u32, u8)> {
        plan.weekly_allocations
            .iter()
            .map(|wa| (wa.week_number, wa.allocation.percent()))
            .collect()
    }

    #[test]
    fn timeline_never_empty() {
        assert_eq!(WeekTimeline::new(0).week_count(), 1);
        assert_eq!(WeekTimeline::default().to_vec(), vec![1]);
    }

    #[test]
    fn timeline_length_is_capped() {
        assert_eq!(WeekTimeline::new(4_000_000_000).week_count(), MAX_WEEKS);
        assert_eq!(WeekTimeline::new(u32::MAX).week_count(), MAX_WEEKS);
    }

    #[test]
    fn full_timeline_refuses_new_weeks() {
        let timeline = WeekTimeline::new(MAX_WEEKS);
        let plan = ResourcePlan::new("a").with_allocations([(1, 50)]);

        let err = timeline.append_week(std::slice::from_ref(&plan)).unwrap_err();
        assert_eq!(err, TimelineError::TimelineFull(MAX_WEEKS));
        assert!(!err.is_declined());
        assert_eq!(
            timeline.insert_week_at(0, &[plan]),
            Err(TimelineError::TimelineFull(MAX_WEEKS))
        );
    }

    #[test]
    fn insertion_mapping_shapes() {
        assert_eq!(
            WeekMapping::insertion(3, 0).sources,
            vec![None, Some(1), Some(2), Some(3)]
        );
        assert_eq!(
            WeekMapping::insertion(3, 2).sources,
            vec![Some(1), Some(2), None, Some(3)]
        );
        assert_eq!(
            WeekMapping::insertion(3, 3).sources,
            vec![Some(1), Some(2), Some(3), None]
        );
    }

    #[test]
    fn removal_mapping_shape() {
        assert_eq!(
            WeekMapping::removal(4, 2).sources,
            vec![Some(1), Some(3), Some(4)]
        );
    }

    #[test]
    fn insert_before_first_week() {
        let timeline = WeekTimeline::new(2);
        let plan = ResourcePlan::new("a").with_allocations([(1, 40), (2, 60)]);

        let edit = timeline.insert_week_at(0, &[plan]).unwrap();

        assert_eq!(edit.timeline.to_vec(), vec![1, 2, 3]);
        assert_eq!(percents(&edit.plans[0]), vec![(1, 0), (2, 40), (3, 60)]);
    }

    #[test]
    fn insert_rejects_position_past_end() {
        let timeline = WeekTimeline::new(3);
        assert_eq!(
            timeline.insert_week_at(4, &[]),
            Err(TimelineError::PositionOutOfRange { position: 4, len: 3 })
        );
    }

    #[test]
    fn remove_declines_last_week() {
        let timeline = WeekTimeline::new(1);
        let err = timeline.remove_week(1, &[]).unwrap_err();
        assert_eq!(err, TimelineError::LastWeek(1));
        assert!(err.is_declined());
    }

    #[test]
    fn remove_declines_unknown_week() {
        let timeline = WeekTimeline::new(3);
        for week in [0, 4] {
            let err = timeline.remove_week(week, &[]).unwrap_err();
            assert!(err.is_declined(), "week {week} should be declined");
        }
    }

    #[test]
    fn reconcile_fills_gaps_and_trims_overflow() {
        let timeline = WeekTimeline::new(3);
        let plan = ResourcePlan::new("a").with_allocations([(1, 10), (3, 30), (5, 50)]);

        let fitted = timeline.reconcile(&plan);

        assert_eq!(percents(&fitted), vec![(1, 10), (2, 0), (3, 30)]);
    }

    #[test]
    fn edit_keeps_plan_fields() {
        let timeline = WeekTimeline::new(1);
        let plan = ResourcePlan::new("pm")
            .role("Project Manager")
            .name("Sarah Johnson")
            .rates(27.0, 49.0)
            .with_allocations([(1, 50)]);

        let edit = timeline.append_week(std::slice::from_ref(&plan)).unwrap();
        let updated = &edit.plans[0];

        assert_eq!(updated.id, "pm");
        assert_eq!(updated.role, "Project Manager");
        assert_eq!(updated.name.as_deref(), Some("Sarah Johnson"));
        assert_eq!(updated.client_hourly_rate, 49.0);
        assert_eq!(percents(updated), vec![(1, 50), (2, 0)]);
    }
}
