//! Property tests for fitting and querying the yacht index.

use berth_core::Error;
use berth_features::{Dataset, SeasonalPrices, YachtRecord};
use berth_knn::{Metric, RecommendFilters, Recommender, fit, recommend_all};
use proptest::prelude::*;

// ============================================================================
// Strategies
// ============================================================================

const TYPES: [&str; 3] = ["Sail", "Motor", "Catamaran"];
const COUNTRIES: [&str; 4] = ["Italy", "Greece", "Spain", "USA"];

fn metric_strategy() -> impl Strategy<Value = Metric> {
    prop_oneof![
        Just(Metric::Cosine),
        Just(Metric::Euclidean),
        Just(Metric::Manhattan),
    ]
}

fn record_strategy() -> impl Strategy<Value = YachtRecord> {
    (
        proptest::option::of(1u32..40),
        proptest::option::of(0u32..12),
        proptest::option::of(5.0f64..90.0),
        proptest::option::of(1980i32..2025),
        proptest::option::of(3.0f64..5.0),
        proptest::option::of(500.0f64..200_000.0),
        proptest::option::of(0usize..TYPES.len()),
        proptest::option::of(0usize..COUNTRIES.len()),
    )
        .prop_map(|(guests, crew, length, year, rating, price, t, c)| {
            let mut record = YachtRecord::new("");
            record.guests = guests;
            record.crew = crew;
            record.length = length;
            record.year = year;
            record.rating = rating;
            record.prices = SeasonalPrices::new(price, price.map(|p| p * 1.5), None, price);
            record.yacht_type = t.map(|i| TYPES[i].to_string());
            record.country = c.map(|i| COUNTRIES[i].to_string());
            record
        })
}

fn dataset_strategy(min: usize, max: usize) -> impl Strategy<Value = Dataset> {
    proptest::collection::vec(record_strategy(), min..max).prop_map(|records| {
        let records = records
            .into_iter()
            .enumerate()
            .map(|(i, mut r)| {
                r.id = format!("yacht-{i}");
                r
            })
            .collect();
        Dataset::from_records(records).unwrap()
    })
}

fn filters_strategy() -> impl Strategy<Value = RecommendFilters> {
    (
        proptest::option::of(500.0f64..200_000.0),
        proptest::option::of(1u32..40),
        proptest::collection::vec(0usize..COUNTRIES.len(), 0..3),
        proptest::collection::vec(0usize..TYPES.len(), 0..2),
    )
        .prop_map(|(max_price, min_guests, countries, types)| RecommendFilters {
            max_price,
            min_guests,
            countries: countries.into_iter().map(|i| COUNTRIES[i].to_string()).collect(),
            types: types.into_iter().map(|i| TYPES[i].to_string()).collect(),
        })
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn unfiltered_returns_exactly_k(
        dataset in dataset_strategy(6, 30),
        metric in metric_strategy(),
        k in 1usize..5,
    ) {
        let index = fit(&dataset, metric, k + 1).unwrap();
        for id in dataset.ids() {
            let recs = index.recommend(id, k, None).unwrap();
            prop_assert_eq!(recs.len(), k);
        }
    }

    #[test]
    fn never_recommends_itself(
        dataset in dataset_strategy(3, 25),
        metric in metric_strategy(),
    ) {
        let n_neighbors = dataset.len();
        let index = fit(&dataset, metric, n_neighbors).unwrap();
        for id in dataset.ids() {
            let recs = index.recommend(id, n_neighbors, None).unwrap();
            prop_assert_eq!(recs.len(), n_neighbors - 1);
            prop_assert!(recs.iter().all(|r| r.record.id != id));
        }
    }

    #[test]
    fn scores_bounded_and_ordered(
        dataset in dataset_strategy(4, 25),
        metric in metric_strategy(),
    ) {
        let index = fit(&dataset, metric, 3).unwrap();
        for id in dataset.ids() {
            let recs = index.recommend(id, 10, None).unwrap();
            prop_assert!(recs.iter().all(|r| (0.0..=1.0).contains(&r.similarity_score)));
            prop_assert!(recs.windows(2).all(|w| w[0].similarity_score >= w[1].similarity_score));
        }
    }

    #[test]
    fn repeated_queries_are_identical(
        dataset in dataset_strategy(4, 20),
        metric in metric_strategy(),
    ) {
        let index = fit(&dataset, metric, 3).unwrap();
        for id in dataset.ids() {
            let first = index.recommend(id, 2, None).unwrap();
            let second = index.recommend(id, 2, None).unwrap();
            prop_assert_eq!(first, second);
        }
    }

    #[test]
    fn filtered_results_satisfy_filters_and_come_from_pool(
        dataset in dataset_strategy(5, 25),
        metric in metric_strategy(),
        filters in filters_strategy(),
        top_k in 1usize..6,
    ) {
        let index = fit(&dataset, metric, 4).unwrap();
        for id in dataset.ids() {
            let pool: Vec<String> = index
                .recommend(id, usize::MAX, None)
                .unwrap()
                .into_iter()
                .map(|r| r.record.id)
                .collect();
            let recs = index.recommend(id, top_k, Some(&filters)).unwrap();

            prop_assert!(recs.len() <= top_k);
            for r in &recs {
                prop_assert!(filters.matches(&r.record));
                prop_assert!(pool.contains(&r.record.id));
            }
        }
    }

    #[test]
    fn unknown_id_is_not_found(dataset in dataset_strategy(3, 10)) {
        let index = fit(&dataset, Metric::Cosine, 2).unwrap();
        let err = index.recommend("no-such-yacht", 2, None).unwrap_err();
        prop_assert!(err.is_not_found());
    }

    #[test]
    fn batch_has_one_entry_per_yacht(dataset in dataset_strategy(3, 20)) {
        let index = fit(&dataset, Metric::Manhattan, 2).unwrap();
        let entries = recommend_all(&index, 1);
        prop_assert_eq!(entries.len(), dataset.len());
        prop_assert!(entries.iter().all(|e| e.error.is_none()));
    }
}

// ============================================================================
// Examples
// ============================================================================

fn three_yachts() -> Dataset {
    Dataset::from_records(vec![
        YachtRecord::new("A")
            .with_price(10_000.0)
            .with_guests(4)
            .with_type("Sail")
            .with_country("Italy"),
        YachtRecord::new("B")
            .with_price(11_000.0)
            .with_guests(4)
            .with_type("Sail")
            .with_country("Italy"),
        YachtRecord::new("C")
            .with_price(90_000.0)
            .with_guests(20)
            .with_type("Motor")
            .with_country("USA"),
    ])
    .unwrap()
}

#[test]
fn similar_sailboat_ranks_above_motor_yacht() {
    let index = fit(&three_yachts(), Metric::Cosine, 3).unwrap();
    let recs = index.recommend("A", 2, None).unwrap();

    assert_eq!(recs.len(), 2);
    assert_eq!(recs[0].record.id, "B");
    assert_eq!(recs[1].record.id, "C");
    assert!(recs[0].similarity_score > recs[1].similarity_score);
}

#[test]
fn cosine_first_result_has_highest_score() {
    let dataset = Dataset::from_records(
        three_yachts()
            .into_records()
            .into_iter()
            .chain([YachtRecord::new("D")
                .with_price(12_000.0)
                .with_guests(6)
                .with_type("Sail")
                .with_country("Greece")])
            .collect(),
    )
    .unwrap();
    let index = fit(&dataset, Metric::Cosine, 3).unwrap();
    let recs = index.recommend("A", 2, None).unwrap();

    assert_eq!(recs[0].record.id, "B");
    assert!(recs.iter().all(|r| r.similarity_score <= recs[0].similarity_score));
    assert!(!recs.iter().any(|r| r.record.id == "C"));
}

#[test]
fn too_many_neighbors_is_config_error() {
    let err = fit(&three_yachts(), Metric::Euclidean, 5).unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}

#[test]
fn query_before_fit_is_not_fitted() {
    let recommender = Recommender::default();
    assert!(matches!(
        recommender.recommend("A", 2, None),
        Err(Error::NotFitted(_))
    ));
}

#[test]
fn csv_without_id_column_uses_row_positions() {
    let csv = "\
name,type,guests,cabins,crew,length,year,rating,summerLowSeasonPrice,summerHighSeasonPrice,winterLowSeasonPrice,winterHighSeasonPrice,baseMarina
One,Sail,4,2,1,12,2010,4.1,1000,1200,900,950,Mykonos
Two,Sail,4,2,1,13,2011,4.3,1100,1300,950,990,Mykonos
Three,Motor,12,5,4,40,2018,4.9,20000,25000,15000,18000,Dubai
";
    let dataset = Dataset::from_reader(csv.as_bytes()).unwrap();
    assert!(!dataset.has_identifiers());

    let index = fit(&dataset, Metric::Cosine, 2).unwrap();
    let recs = index.recommend("0", 1, None).unwrap();
    assert_eq!(recs[0].record.id, "1");
    assert_eq!(
        index.get_record("2").unwrap().country.as_deref(),
        Some("UAE")
    );
}
