use ndarray::ArrayView2;

use ltr_domain::{FeatureTable, ParamValue, Params, SearchSpace};
use ltr_providers::{Classifier, GaussianNb, RandomSearch};
use ltr_service::{
	Error, Evaluator, ForwardFeatureSelector, HyperparameterSearch, SearchData, Settings,
	search_space,
};
use ltr_storage::{MemoryStore, RunLog};
use ltr_testkit::{ScriptedClassifier, SequenceOptimizer, qrels, table};

fn evaluator() -> (Evaluator, MemoryStore) {
	let store = MemoryStore::new();

	(Evaluator::new(RunLog::open(store.clone()).expect("Open memory log.")), store)
}

fn flip(value: i64) -> Params {
	Params::from([("flip".to_string(), ParamValue::Integer(value))])
}

/// Logistic score of the first column, mirrored unless `flip` is 1.
fn flip_scorer(params: &Params, features: ArrayView2<'_, f64>) -> Vec<f64> {
	let sign = match params.get("flip").and_then(ParamValue::as_i64) {
		Some(1) => 1.0,
		_ => -1.0,
	};

	features.column(0).iter().map(|value| 1.0 / (1.0 + (-sign * value).exp())).collect()
}

fn partition(query: &str, magnitude: f64) -> FeatureTable {
	table(
		&["signal"],
		&[(query, "bad", &[-magnitude], 0), (query, "good", &[magnitude], 1)],
	)
	.expect("Partition table.")
}

#[test]
fn tuning_maximizes_validation_mrr_and_records_the_test_run() {
	let (mut evaluator, store) = evaluator();
	let train = partition("t", 1.0);
	let test = partition("x", 5.0);
	let validation = partition("v", 10.0);
	let qrels_test = qrels(&[("x", "good", 1)]);
	let qrels_validation = qrels(&[("v", "good", 1)]);
	let mut classifier = ScriptedClassifier::from_fn(flip_scorer);
	let mut search =
		HyperparameterSearch::new(SequenceOptimizer::new(vec![flip(0), flip(1), flip(0)]), 3);
	let outcome = search
		.optimize(
			&mut evaluator,
			&mut classifier,
			None,
			&SearchSpace::default(),
			SearchData {
				train: &train,
				test: &test,
				validation: &validation,
				qrels_test: &qrels_test,
				qrels_validation: &qrels_validation,
			},
			&Settings::default(),
		)
		.expect("Search succeeds.");

	assert_eq!(outcome.best_score, 1.0);
	assert_eq!(outcome.best_params, flip(1));
	assert_eq!(outcome.trials, 3);
	assert_eq!(outcome.test.score, 1.0);
	assert_eq!(classifier.fits(), 4);

	let records = store.snapshot();

	assert_eq!(records.len(), 1);
	assert_eq!(records[0].hyperparameters, flip(1));
	assert_eq!(records[0].test_rows, 2);
}

#[test]
fn objective_failures_surface_as_the_original_error() {
	let (mut evaluator, store) = evaluator();
	let train = partition("t", 1.0);
	let test = partition("x", 5.0);
	let validation = partition("v", 10.0);
	let judgments = qrels(&[("v", "good", 1)]);
	let mut classifier = ScriptedClassifier::from_fn(flip_scorer).failing_fit("no variance");
	let result = HyperparameterSearch::new(SequenceOptimizer::new(vec![flip(1)]), 2).optimize(
		&mut evaluator,
		&mut classifier,
		None,
		&SearchSpace::default(),
		SearchData {
			train: &train,
			test: &test,
			validation: &validation,
			qrels_test: &judgments,
			qrels_validation: &judgments,
		},
		&Settings::default(),
	);

	assert!(matches!(result, Err(Error::ModelFit { .. })));
	assert!(store.snapshot().is_empty());
}

#[test]
fn random_search_tunes_gaussian_naive_bayes() {
	let (mut evaluator, _store) = evaluator();
	let train = table(
		&["signal"],
		&[
			("t", "a", &[2.0], 1),
			("t", "b", &[-2.0], 0),
			("t", "c", &[1.5], 1),
			("t", "d", &[-1.0], 0),
		],
	)
	.expect("Train.");
	let test = partition("x", 1.0);
	let validation = partition("v", 1.5);
	let qrels_test = qrels(&[("x", "good", 1)]);
	let qrels_validation = qrels(&[("v", "good", 1)]);
	let space = search_space(&[ltr_config::SearchDimension::Real {
		name: "var_smoothing".to_string(),
		low: 1e-12,
		high: 1e-3,
		log_scale: true,
	}]);
	let mut classifier = GaussianNb::default();
	let outcome = HyperparameterSearch::new(RandomSearch::new(42), 5)
		.optimize(
			&mut evaluator,
			&mut classifier,
			None,
			&space,
			SearchData {
				train: &train,
				test: &test,
				validation: &validation,
				qrels_test: &qrels_test,
				qrels_validation: &qrels_validation,
			},
			&Settings { record: false, ..Settings::default() },
		)
		.expect("Search succeeds.");

	assert_eq!(outcome.trials, 5);
	assert_eq!(outcome.best_score, 1.0);
	assert!(space.dimensions()[0].domain.contains(&outcome.best_params["var_smoothing"]));
	assert_eq!(classifier.parameters(), outcome.best_params);
}

/// Confidence of the `good` row (last) is fixed; the decoys above it drop
/// out one per column, so every extra feature improves the rank.
fn column_count_scorer(_params: &Params, features: ArrayView2<'_, f64>) -> Vec<f64> {
	let rows = features.nrows();
	let above = 3usize.saturating_sub(features.ncols());

	(0..rows)
		.map(|row| match row {
			_ if row + 1 == rows => 0.5,
			_ if row < above => 0.9,
			_ => 0.1,
		})
		.collect()
}

fn decoy_partition(query: &str) -> FeatureTable {
	table(
		&["a", "b", "c"],
		&[
			(query, "d1", &[1.0, 0.0, 2.0], 0),
			(query, "d2", &[0.0, 1.0, 1.0], 0),
			(query, "d3", &[2.0, 2.0, 0.0], 0),
			(query, "good", &[1.0, 1.0, 1.0], 1),
		],
	)
	.expect("Decoy table.")
}

#[test]
fn selection_commits_one_feature_per_round_without_repeats() {
	let (mut evaluator, _store) = evaluator();
	let train = decoy_partition("t");
	let test = decoy_partition("x");
	let validation = decoy_partition("v");
	let qrels_test = qrels(&[("x", "good", 1)]);
	let qrels_validation = qrels(&[("v", "good", 1)]);
	let mut classifier = ScriptedClassifier::from_fn(column_count_scorer);
	let search = HyperparameterSearch::new(SequenceOptimizer::new(vec![Params::new()]), 1);
	let outcome = ForwardFeatureSelector::new(search)
		.select(
			&mut evaluator,
			&mut classifier,
			&SearchSpace::default(),
			SearchData {
				train: &train,
				test: &test,
				validation: &validation,
				qrels_test: &qrels_test,
				qrels_validation: &qrels_validation,
			},
			&Settings { record: false, ..Settings::default() },
		)
		.expect("Selection succeeds.");

	assert_eq!(outcome.selected, vec!["a".to_string(), "b".to_string(), "c".to_string()]);
	assert_eq!(outcome.score, Some(1.0));
	assert_eq!(outcome.rounds.len(), 3);
	assert_eq!(outcome.rounds[0].candidates.len(), 3);
	assert_eq!(outcome.rounds[2].candidates.len(), 1);
}

#[test]
fn selection_stops_when_no_extension_improves() {
	let (mut evaluator, _store) = evaluator();
	let columns = ["noise", "signal", "echo"];
	let layout = |query: &str| {
		table(
			&columns,
			&[(query, "bad", &[1.0, -1.0, -1.0], 0), (query, "good", &[-1.0, 1.0, 1.0], 1)],
		)
		.expect("Layout table.")
	};
	let train = layout("t");
	let test = layout("x");
	let validation = layout("v");
	let qrels_test = qrels(&[("x", "good", 1)]);
	let qrels_validation = qrels(&[("v", "good", 1)]);
	let mut classifier = ScriptedClassifier::from_fn(|_, features| {
		features
			.rows()
			.into_iter()
			.map(|row| 1.0 / (1.0 + (-row.sum()).exp()))
			.collect()
	});
	let search = HyperparameterSearch::new(SequenceOptimizer::new(vec![Params::new()]), 1);
	let outcome = ForwardFeatureSelector::new(search)
		.select(
			&mut evaluator,
			&mut classifier,
			&SearchSpace::default(),
			SearchData {
				train: &train,
				test: &test,
				validation: &validation,
				qrels_test: &qrels_test,
				qrels_validation: &qrels_validation,
			},
			&Settings { record: false, ..Settings::default() },
		)
		.expect("Selection succeeds.");

	assert_eq!(outcome.selected, vec!["signal".to_string()]);
	assert_eq!(outcome.score, Some(1.0));
	assert_eq!(outcome.rounds.len(), 2);
	assert_eq!(outcome.rounds[0].candidates[0], ("noise".to_string(), 0.5));
	assert_eq!(outcome.rounds[1].committed, None);
}
