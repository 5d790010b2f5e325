use tempfile::TempDir;

use ltr_providers::{GaussianNb, PairwiseReranker};
use ltr_service::{Error, Evaluator, RerankSettings, Settings};
use ltr_storage::{MemoryStore, RunLog};
use ltr_testkit::{ScriptedClassifier, qrels, table};

fn memory_evaluator() -> (Evaluator, MemoryStore) {
	let store = MemoryStore::new();
	let log = RunLog::open(store.clone()).expect("Open memory log.");

	(Evaluator::new(log), store)
}

fn training() -> ltr_domain::FeatureTable {
	table(
		&["bm25", "tf"],
		&[
			("t1", "a", &[3.0, 2.0], 1),
			("t1", "b", &[0.5, 0.1], 0),
			("t2", "c", &[2.5, 1.8], 1),
			("t2", "d", &[0.2, 0.4], 0),
		],
	)
	.expect("Training table.")
}

#[test]
fn first_relevant_passage_on_top_scores_one() {
	let (mut evaluator, store) = memory_evaluator();
	let test = table(
		&["bm25", "tf"],
		&[
			("A", "p1", &[1.0, 1.0], 0),
			("A", "p2", &[0.0, 0.0], 0),
			("A", "p3", &[0.5, 0.5], 0),
			("B", "p1", &[0.2, 0.2], 0),
		],
	)
	.expect("Test table.");
	let mut classifier = ScriptedClassifier::fixed(vec![0.9, 0.1, 0.4, 0.3]);
	let report = evaluator
		.evaluate(
			&mut classifier,
			None,
			&training(),
			&test,
			&qrels(&[("A", "p1", 1)]),
			&Settings::default(),
		)
		.expect("Evaluation succeeds.");

	assert_eq!(report.score, 1.0);
	assert_eq!(report.ranking.judged_queries, 1);
	assert_eq!(report.ranking.excluded_queries, vec!["B".to_string()]);
	assert_eq!(report.full.evaluated, 4);
	assert_eq!(report.full.recall, 1.0);
	assert_eq!(report.full.precision, 1.0);

	let records = store.snapshot();

	assert_eq!(records.len(), 1);
	assert_eq!(Some(records[0].run_id), report.run_id);
	assert_eq!(records[0].metrics.mrr, 1.0);
	assert_eq!(records[0].features, vec!["bm25".to_string(), "tf".to_string()]);
	assert_eq!(records[0].train_rows, 4);
	assert_eq!(records[0].test_rows, 4);
	assert_eq!(records[0].cutoff, 50);
	assert_eq!(classifier.fits(), 1);
}

#[test]
fn fit_failures_propagate_and_record_nothing() {
	let (mut evaluator, store) = memory_evaluator();
	let test = table(&["bm25", "tf"], &[("A", "p1", &[1.0, 1.0], 0)]).expect("Test table.");
	let mut classifier = ScriptedClassifier::fixed(vec![0.9]).failing_fit("singular matrix");
	let result = evaluator.evaluate(
		&mut classifier,
		None,
		&training(),
		&test,
		&qrels(&[("A", "p1", 1)]),
		&Settings::default(),
	);

	match result {
		Err(Error::ModelFit { message }) => assert_eq!(message, "singular matrix"),
		other => panic!("Expected a model fit error, got {other:?}."),
	}

	assert!(store.snapshot().is_empty());
}

#[test]
fn unjudged_result_sets_score_zero() {
	let (mut evaluator, _store) = memory_evaluator();
	let test = table(&["bm25", "tf"], &[("A", "p1", &[1.0, 1.0], 0), ("B", "p2", &[0.0, 0.0], 0)])
		.expect("Test table.");
	let settings = Settings { record: false, ..Settings::default() };
	let report = evaluator
		.evaluate(
			&mut ScriptedClassifier::fixed(vec![0.8, 0.2]),
			None,
			&training(),
			&test,
			&qrels(&[]),
			&settings,
		)
		.expect("Evaluation succeeds.");

	assert_eq!(report.score, 0.0);
	assert_eq!(report.ranking.excluded_queries.len(), 2);
	assert_eq!(report.full.precision, 0.0);
	assert!(report.full.recall.is_nan());
	assert!(report.run_id.is_none());
	assert!(evaluator.log().is_empty());
}

#[test]
fn gaussian_naive_bayes_ranks_the_relevant_passage_first() {
	let (mut evaluator, _store) = memory_evaluator();
	let test = table(
		&["bm25", "tf"],
		&[
			("q1", "x", &[0.3, 0.2], 0),
			("q1", "y", &[2.8, 1.9], 0),
			("q2", "z", &[0.1, 0.3], 0),
			("q2", "w", &[2.6, 2.0], 0),
		],
	)
	.expect("Test table.");
	let report = evaluator
		.evaluate(
			&mut GaussianNb::default(),
			None,
			&training(),
			&test,
			&qrels(&[("q1", "y", 1), ("q2", "w", 2)]),
			&Settings { cutoff: 1, ..Settings::default() },
		)
		.expect("Evaluation succeeds.");

	assert_eq!(report.score, 1.0);
	assert_eq!(report.ranking.mean_average_precision, 1.0);
	assert!((report.ranking.mean_ndcg - 1.0).abs() < 1e-12);
	assert_eq!(report.at_cutoff.evaluated, 2);
	assert_eq!(report.cutoff, 1);
}

#[test]
fn reranked_runs_record_the_reranker() {
	let (mut evaluator, store) = memory_evaluator();
	let test = table(
		&["bm25", "tf"],
		&[("q1", "x", &[0.3, 0.2], 0), ("q1", "y", &[2.8, 1.9], 0), ("q1", "z", &[1.0, 1.0], 0)],
	)
	.expect("Test table.");
	let mut reranker = PairwiseReranker::new(GaussianNb::default(), 100);
	let settings =
		Settings { rerank: Some(RerankSettings { top_k: 2, retrain: true }), ..Settings::default() };
	let report = evaluator
		.evaluate(
			&mut GaussianNb::default(),
			Some(&mut reranker),
			&training(),
			&test,
			&qrels(&[("q1", "y", 1)]),
			&settings,
		)
		.expect("Evaluation succeeds.");

	assert_eq!(report.score, 1.0);

	let records = store.snapshot();

	assert_eq!(records[0].rerank_top_k, Some(2));
	assert!(records[0].rerank_model.as_deref().is_some_and(|model| model.starts_with("Pairwise(")));
}

#[test]
fn recorded_runs_persist_across_evaluators() {
	let dir = TempDir::new().expect("Temp dir.");
	let path = dir.path().join("runs.json");
	let test = table(&["bm25", "tf"], &[("A", "p1", &[1.0, 1.0], 0), ("A", "p2", &[0.0, 0.0], 0)])
		.expect("Test table.");

	for confidences in [vec![0.9, 0.1], vec![0.1, 0.9]] {
		let mut evaluator = Evaluator::new(RunLog::open_file(&path).expect("Open log."));

		evaluator
			.evaluate(
				&mut ScriptedClassifier::fixed(confidences),
				None,
				&training(),
				&test,
				&qrels(&[("A", "p1", 1)]),
				&Settings::default(),
			)
			.expect("Evaluation succeeds.");
	}

	let log = RunLog::open_file(&path).expect("Reopen log.");
	let scores: Vec<f64> = log.records().iter().map(|record| record.metrics.mrr).collect();

	assert_eq!(scores, vec![1.0, 0.5]);
	assert_ne!(log.records()[0].run_id, log.records()[1].run_id);
	assert_eq!(log.records()[0].fingerprint, log.records()[1].fingerprint);
}
