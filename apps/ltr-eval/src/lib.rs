use std::{
	fs,
	path::{Path, PathBuf},
};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{self, WrapErr};
use serde::{Serialize, de::DeserializeOwned};
use tracing_subscriber::EnvFilter;

use ltr_config::Config;
use ltr_domain::{FeatureTable, Qrel, Qrels};
use ltr_providers::{GaussianNb, PairwiseReranker, RandomSearch, Reranker};
use ltr_service::{
	Evaluator, ForwardFeatureSelector, HyperparameterSearch, SearchData, Settings, search_space,
};
use ltr_storage::RunLog;

#[derive(Debug, Parser)]
#[command(
	version = ltr_cli::VERSION,
	rename_all = "kebab",
	styles = ltr_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
	#[command(subcommand)]
	pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
	/// Fit on the training table and score the test table.
	Evaluate(EvaluateArgs),
	/// Tune classifier hyperparameters on the validation table.
	Tune(TuneArgs),
	/// Greedy forward feature selection.
	Select(SelectArgs),
	/// Print recorded runs.
	Runs(RunsArgs),
}

#[derive(Debug, clap::Args)]
pub struct EvaluateArgs {
	#[arg(long, value_name = "FILE")]
	pub train: PathBuf,
	#[arg(long, value_name = "FILE")]
	pub test: PathBuf,
	#[arg(long, value_name = "FILE")]
	pub qrels: PathBuf,
	#[command(flatten)]
	pub overrides: Overrides,
	/// Re-rank each query's head with the pairwise model from `[rerank]`.
	#[arg(long)]
	pub rerank: bool,
}

#[derive(Debug, clap::Args)]
pub struct TuneArgs {
	#[command(flatten)]
	pub inputs: SearchInputs,
	#[command(flatten)]
	pub overrides: Overrides,
	#[arg(long)]
	pub rerank: bool,
}

#[derive(Debug, clap::Args)]
pub struct SelectArgs {
	#[command(flatten)]
	pub inputs: SearchInputs,
	#[command(flatten)]
	pub overrides: Overrides,
}

#[derive(Debug, clap::Args)]
pub struct SearchInputs {
	#[arg(long, value_name = "FILE")]
	pub train: PathBuf,
	#[arg(long, value_name = "FILE")]
	pub test: PathBuf,
	#[arg(long, value_name = "FILE")]
	pub val: PathBuf,
	#[arg(long, value_name = "FILE")]
	pub qrels: PathBuf,
	#[arg(long, value_name = "FILE")]
	pub qrels_val: PathBuf,
	#[arg(long, value_name = "N")]
	pub trials: Option<usize>,
	#[arg(long, value_name = "N")]
	pub seed: Option<u64>,
}

#[derive(Debug, clap::Args)]
pub struct Overrides {
	#[arg(long, value_name = "N")]
	pub cutoff: Option<usize>,
	#[arg(long, value_name = "N")]
	pub reduction: Option<usize>,
	#[arg(long)]
	pub no_record: bool,
}

#[derive(Debug, clap::Args)]
pub struct RunsArgs {
	#[arg(long, value_name = "N")]
	pub last: Option<usize>,
}

struct SearchTables {
	train: FeatureTable,
	test: FeatureTable,
	validation: FeatureTable,
	qrels_test: Qrels,
	qrels_validation: Qrels,
}
impl SearchTables {
	fn load(inputs: &SearchInputs) -> color_eyre::Result<Self> {
		Ok(Self {
			train: load_json(&inputs.train)?,
			test: load_json(&inputs.test)?,
			validation: load_json(&inputs.val)?,
			qrels_test: load_qrels(&inputs.qrels)?,
			qrels_validation: load_qrels(&inputs.qrels_val)?,
		})
	}

	fn data(&self) -> SearchData<'_> {
		SearchData {
			train: &self.train,
			test: &self.test,
			validation: &self.validation,
			qrels_test: &self.qrels_test,
			qrels_validation: &self.qrels_validation,
		}
	}
}

pub fn run(args: Args) -> color_eyre::Result<()> {
	let config = ltr_config::load(&args.config)?;
	let filter = EnvFilter::new(config.service.log_level.clone());

	tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

	match args.command {
		Command::Evaluate(cmd) => evaluate(&config, cmd),
		Command::Tune(cmd) => tune(&config, cmd),
		Command::Select(cmd) => select(&config, cmd),
		Command::Runs(cmd) => runs(&config, cmd),
	}
}

fn evaluate(config: &Config, cmd: EvaluateArgs) -> color_eyre::Result<()> {
	let train: FeatureTable = load_json(&cmd.train)?;
	let test: FeatureTable = load_json(&cmd.test)?;
	let qrels = load_qrels(&cmd.qrels)?;
	let settings = resolve_settings(config, &cmd.overrides);
	let mut evaluator = Evaluator::new(RunLog::open_file(&config.storage.run_log)?);
	let mut classifier = GaussianNb::new(config.classifier.var_smoothing);
	let mut reranker = pairwise_reranker(config, cmd.rerank)?;
	let report = evaluator.evaluate(
		&mut classifier,
		reranker.as_mut().map(|reranker| reranker as &mut dyn Reranker),
		&train,
		&test,
		&qrels,
		&settings,
	)?;

	print_json(&report)
}

fn tune(config: &Config, cmd: TuneArgs) -> color_eyre::Result<()> {
	let tables = SearchTables::load(&cmd.inputs)?;
	let settings = resolve_settings(config, &cmd.overrides);
	let space = search_space(&config.search.space);
	let mut evaluator = Evaluator::new(RunLog::open_file(&config.storage.run_log)?);
	let mut classifier = GaussianNb::new(config.classifier.var_smoothing);
	let mut reranker = pairwise_reranker(config, cmd.rerank)?;
	let mut search = HyperparameterSearch::new(
		RandomSearch::new(cmd.inputs.seed.unwrap_or(config.search.seed)),
		cmd.inputs.trials.unwrap_or(config.search.trials),
	);
	let outcome = search.optimize(
		&mut evaluator,
		&mut classifier,
		reranker.as_mut().map(|reranker| reranker as &mut dyn Reranker),
		&space,
		tables.data(),
		&settings,
	)?;

	print_json(&outcome)
}

fn select(config: &Config, cmd: SelectArgs) -> color_eyre::Result<()> {
	let tables = SearchTables::load(&cmd.inputs)?;
	let settings = resolve_settings(config, &cmd.overrides);
	let space = search_space(&config.search.space);
	let mut evaluator = Evaluator::new(RunLog::open_file(&config.storage.run_log)?);
	let mut classifier = GaussianNb::new(config.classifier.var_smoothing);
	let search = HyperparameterSearch::new(
		RandomSearch::new(cmd.inputs.seed.unwrap_or(config.search.seed)),
		cmd.inputs.trials.unwrap_or(config.search.trials),
	);
	let outcome = ForwardFeatureSelector::new(search).select(
		&mut evaluator,
		&mut classifier,
		&space,
		tables.data(),
		&settings,
	)?;

	print_json(&outcome)
}

fn runs(config: &Config, cmd: RunsArgs) -> color_eyre::Result<()> {
	let log = RunLog::open_file(&config.storage.run_log)?;
	let records = log.records();
	let skip = cmd.last.map_or(0, |last| records.len().saturating_sub(last));

	print_json(&records[skip..])
}

fn resolve_settings(config: &Config, overrides: &Overrides) -> Settings {
	let mut settings = Settings::from_config(config);

	if let Some(cutoff) = overrides.cutoff {
		settings.cutoff = cutoff;
	}
	if let Some(reduction) = overrides.reduction {
		settings.reduction_components = reduction;
	}
	if overrides.no_record {
		settings.record = false;
	}

	settings
}

fn pairwise_reranker(
	config: &Config,
	enabled: bool,
) -> color_eyre::Result<Option<PairwiseReranker<GaussianNb>>> {
	if !enabled {
		return Ok(None);
	}

	let Some(rerank) = &config.rerank else {
		return Err(eyre::eyre!("--rerank requires a [rerank] section in the configuration."));
	};

	let inner = GaussianNb::new(config.classifier.var_smoothing);

	Ok(Some(PairwiseReranker::new(inner, rerank.max_pairs)))
}

fn load_json<T>(path: &Path) -> color_eyre::Result<T>
where
	T: DeserializeOwned,
{
	let raw = fs::read_to_string(path)
		.wrap_err_with(|| format!("Failed to read {}.", path.display()))?;
	let value = serde_json::from_str(&raw)
		.wrap_err_with(|| format!("Failed to parse {}.", path.display()))?;

	Ok(value)
}

fn load_qrels(path: &Path) -> color_eyre::Result<Qrels> {
	let judgments: Vec<Qrel> = load_json(path)?;

	tracing::debug!(path = %path.display(), judgments = judgments.len(), "Judgments loaded.");

	Ok(judgments.into_iter().collect())
}

fn print_json<T>(value: &T) -> color_eyre::Result<()>
where
	T: Serialize + ?Sized,
{
	let json = serde_json::to_string_pretty(value)?;

	println!("{json}");

	Ok(())
}
