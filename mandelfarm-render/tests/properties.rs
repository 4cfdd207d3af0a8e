use proptest::prelude::*;

use mandelfarm_core::{PlaneOrigin, ViewState};
use mandelfarm_render::{partition, Aggregator, Row, TASKS_PER_JOB};

fn view() -> ViewState {
    ViewState::new(PlaneOrigin::new(-2.0, -1.5), 0.01).unwrap()
}

proptest! {
    #[test]
    fn bands_tile_the_image(height in 1u32..2000, parallelism in 1usize..17) {
        let p = partition(7, height, &view(), parallelism).unwrap();
        prop_assert_eq!(p.requests().len(), parallelism * TASKS_PER_JOB);

        let total: u32 = p.requests().iter().map(|r| r.height).sum();
        prop_assert_eq!(total, height);

        // Consecutive non-empty bands meet exactly.
        let mut next = 0;
        for r in p.requests().iter().filter(|r| r.height > 0) {
            prop_assert_eq!(r.first_row, next);
            next = r.first_row + r.height;
        }
        prop_assert_eq!(next, height);
    }

    #[test]
    fn jobs_hold_consecutive_tasks(height in 1u32..500, parallelism in 1usize..9) {
        let p = partition(3, height, &view(), parallelism).unwrap();
        let jobs: Vec<_> = p.jobs().collect();
        prop_assert_eq!(jobs.len(), parallelism);
        for (j, (first, tasks)) in jobs.iter().enumerate() {
            prop_assert_eq!(*first, j * TASKS_PER_JOB);
            prop_assert_eq!(*tasks, &p.requests()[*first..*first + TASKS_PER_JOB]);
        }
    }

    #[test]
    fn aggregation_ignores_arrival_order(
        order in Just((0u32..64).collect::<Vec<_>>()).prop_shuffle()
    ) {
        let mut agg = Aggregator::new(2, 64);
        for &y in &order {
            agg.accept(Row::new(y, vec![y, y + 1])).unwrap();
        }
        let image = agg.finish().unwrap();
        for (i, row) in image.rows.iter().enumerate() {
            prop_assert_eq!(row.y, i as u32);
            prop_assert_eq!(&row.pixels, &vec![i as u32, i as u32 + 1]);
        }
    }
}
