//! rubricdash - review dashboard CLI
//!
//! The `rubricdash` command scores student project artifacts against their
//! rubric and talks to the review backend.
//!
//! ## Commands
//!
//! - `projects`: List projects with review progress
//! - `show`: Show the review board for one artifact type
//! - `review`: Score and comment one artifact, then save
//! - `comment`: Save the general comment for an artifact type
//! - `evaluate`: Show or edit the project-level rubric evaluation
//! - `criteria`: Print the rubric for an artifact type

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{info, Level};

use rubricdash_client::{ClientConfig, HttpGateway, Project};
use rubricdash_core::{
    criteria_averages, round_half, AggregateRubric, ArtifactId, ArtifactType, Capability,
    EvaluationCriterion, EvaluationTracker, ProjectId, ReviewBoard, ReviewGateway,
    ReviewProgress, ReviewSession, Rubric, SaveOutcome, METRICS,
};

/// Highest score a criterion can take.
const MAX_SCORE: f64 = 5.0;

#[derive(Parser)]
#[command(name = "rubricdash")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Rubric-based review dashboard for student projects", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print results as JSON and emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    /// Review backend base URL
    #[arg(long, global = true, env = "RUBRICDASH_API_URL")]
    api_url: Option<String>,

    /// Bearer token for the review backend [env: RUBRICDASH_TOKEN]
    #[arg(long, global = true)]
    token: Option<String>,

    /// Read the bearer token from a file
    #[arg(long, global = true, conflicts_with = "token")]
    token_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List projects with review progress
    Projects,

    /// Show the review board for one project and artifact type
    Show {
        /// Project id
        #[arg(short, long)]
        project: String,

        /// Artifact type (e.g. requirements, use-case-diagrams)
        #[arg(short = 't', long = "type", value_parser = parse_artifact_type)]
        artifact_type: ArtifactType,

        /// Also compute criteria averages locally from the artifacts
        #[arg(long)]
        local: bool,
    },

    /// Score and comment one artifact, then save the review
    Review {
        /// Project id
        #[arg(short, long)]
        project: String,

        /// Artifact type (e.g. requirements, use-case-diagrams)
        #[arg(short = 't', long = "type", value_parser = parse_artifact_type)]
        artifact_type: ArtifactType,

        /// Artifact id
        #[arg(short, long)]
        artifact: String,

        /// Criterion score as key=value (0-5), repeatable
        #[arg(short, long = "score", value_parser = parse_score)]
        scores: Vec<(String, f64)>,

        /// Review comment
        #[arg(short, long)]
        comment: Option<String>,
    },

    /// Save the general comment for one project and artifact type
    Comment {
        /// Project id
        #[arg(short, long)]
        project: String,

        /// Artifact type (e.g. requirements, use-case-diagrams)
        #[arg(short = 't', long = "type", value_parser = parse_artifact_type)]
        artifact_type: ArtifactType,

        /// Comment text
        #[arg(long)]
        text: String,
    },

    /// Show the project-level rubric evaluation, applying any edits given
    Evaluate {
        /// Project id
        #[arg(short, long)]
        project: String,

        /// Artifact type (e.g. stories, design-patterns)
        #[arg(short = 't', long = "type", value_parser = parse_artifact_type)]
        artifact_type: ArtifactType,

        /// Criterion score as name=value (0-5), repeatable
        #[arg(short, long = "score", value_parser = parse_score)]
        scores: Vec<(String, f64)>,

        /// Criterion comment as name=text, repeatable
        #[arg(long = "note", value_parser = parse_note)]
        notes: Vec<(String, String)>,

        /// General comment for the evaluation
        #[arg(long)]
        general_comment: Option<String>,
    },

    /// Print the rubric for an artifact type
    Criteria {
        /// Artifact type (e.g. requirements, use-case-diagrams)
        #[arg(short = 't', long = "type", value_parser = parse_artifact_type)]
        artifact_type: ArtifactType,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    rubricdash_core::init_tracing(cli.json, level);
    tracing::debug!(version = rubricdash_core::VERSION, "rubricdash starting");

    let result = run(&cli).await;
    METRICS.flush();
    result
}

async fn run(cli: &Cli) -> Result<()> {
    match &cli.command {
        Commands::Criteria { artifact_type } => cmd_criteria(*artifact_type, cli.json),
        Commands::Projects => cmd_projects(&connect(cli)?, cli.json).await,
        Commands::Show {
            project,
            artifact_type,
            local,
        } => cmd_show(connect(cli)?, project, *artifact_type, *local, cli.json).await,
        Commands::Review {
            project,
            artifact_type,
            artifact,
            scores,
            comment,
        } => {
            cmd_review(
                connect(cli)?,
                project,
                *artifact_type,
                artifact,
                scores,
                comment.as_deref(),
                cli.json,
            )
            .await
        }
        Commands::Comment {
            project,
            artifact_type,
            text,
        } => cmd_comment(connect(cli)?, project, *artifact_type, text, cli.json).await,
        Commands::Evaluate {
            project,
            artifact_type,
            scores,
            notes,
            general_comment,
        } => {
            cmd_evaluate(
                connect(cli)?,
                project,
                *artifact_type,
                scores,
                notes,
                general_comment.as_deref(),
                cli.json,
            )
            .await
        }
    }
}

/// Build the HTTP gateway: environment first, then command-line overrides.
fn connect(cli: &Cli) -> Result<HttpGateway> {
    let mut config = ClientConfig::from_env().context("Invalid client configuration")?;
    if let Some(url) = &cli.api_url {
        config.base_url = ClientConfig::new(url).context("Invalid --api-url")?.base_url;
    }
    if let Some(token) = &cli.token {
        config = config.with_token(token);
    }
    if let Some(path) = &cli.token_file {
        config = config
            .with_token_file(path)
            .context("Failed to load token file")?;
    }
    HttpGateway::new(config).context("Failed to create HTTP client")
}

fn parse_artifact_type(s: &str) -> Result<ArtifactType, String> {
    s.parse()
}

/// Parse `key=value` into a criterion score in `0..=5`.
fn parse_score(s: &str) -> Result<(String, f64), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got {s:?}"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing criterion key in {s:?}"));
    }
    let value: f64 = value
        .trim()
        .parse()
        .map_err(|_| format!("score for {key} is not a number: {value:?}"))?;
    if !(0.0..=MAX_SCORE).contains(&value) {
        return Err(format!("score for {key} must be between 0 and {MAX_SCORE}"));
    }
    Ok((key.to_string(), value))
}

/// Parse `name=text` into a criterion comment.
fn parse_note(s: &str) -> Result<(String, String), String> {
    let (name, text) = s
        .split_once('=')
        .ok_or_else(|| format!("expected name=text, got {s:?}"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing criterion name in {s:?}"));
    }
    Ok((name.to_string(), text.trim().to_string()))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Five-star rendering at half-point resolution.
fn stars(rating: f64) -> String {
    let halves = (round_half(rating).clamp(0.0, MAX_SCORE) * 2.0) as usize;
    let full = halves / 2;
    let half = halves % 2;
    let empty = MAX_SCORE as usize - full - half;
    format!("{}{}{}", "★".repeat(full), "½".repeat(half), "☆".repeat(empty))
}

// ---------------------------------------------------------------------------
// criteria
// ---------------------------------------------------------------------------

fn cmd_criteria(artifact_type: ArtifactType, json: bool) -> Result<()> {
    let rubric = Rubric::for_type(artifact_type);
    if json {
        return print_json(&rubric);
    }
    print!("{}", render_criteria(&rubric));
    Ok(())
}

fn render_criteria(rubric: &Rubric) -> String {
    let mut out = format!("{} rubric\n", rubric.artifact_type.label());
    for c in rubric.criteria {
        out.push_str(&format!("  {:<28} {}\n", c.key, c.name));
        out.push_str(&format!("  {:<28} {}\n", "", c.description));
    }
    out
}

// ---------------------------------------------------------------------------
// projects
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct ProjectRow {
    id: ProjectId,
    name: String,
    description: String,
    progress: Vec<TypeProgress>,
}

#[derive(Serialize)]
struct TypeProgress {
    artifact_type: ArtifactType,
    #[serde(flatten)]
    progress: ReviewProgress,
}

fn project_row(project: &Project) -> ProjectRow {
    ProjectRow {
        id: project.id.clone(),
        name: project.name.clone(),
        description: project.description.clone(),
        progress: ArtifactType::ALL
            .into_iter()
            .map(|artifact_type| TypeProgress {
                artifact_type,
                progress: project.progress(artifact_type),
            })
            .filter(|p| p.progress.total > 0)
            .collect(),
    }
}

async fn cmd_projects(gateway: &HttpGateway, json: bool) -> Result<()> {
    let projects = gateway
        .list_projects()
        .await
        .context("Failed to list projects")?;
    let rows: Vec<ProjectRow> = projects.iter().map(project_row).collect();

    if json {
        return print_json(&rows);
    }
    if rows.is_empty() {
        println!("No projects found.");
        return Ok(());
    }
    for row in &rows {
        println!("{}  {}", row.id, row.name);
        if !row.description.is_empty() {
            println!("    {}", row.description);
        }
        for p in &row.progress {
            println!(
                "    {:<20} {}/{} reviewed",
                p.artifact_type.label(),
                p.progress.reviewed,
                p.progress.total
            );
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// show
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct ArtifactRow {
    id: ArtifactId,
    name: String,
    reviewed: bool,
    rating: f64,
}

#[derive(Serialize)]
struct BoardSummary {
    project_id: ProjectId,
    project_name: Option<String>,
    artifact_type: ArtifactType,
    progress: ReviewProgress,
    general_comment: String,
    aggregate: AggregateRubric,
    #[serde(skip_serializing_if = "Option::is_none")]
    local_aggregate: Option<AggregateRubric>,
    artifacts: Vec<ArtifactRow>,
}

fn board_summary(board: &ReviewBoard, local: bool) -> BoardSummary {
    let rubric = Rubric::for_type(board.artifact_type());
    BoardSummary {
        project_id: board.project_id().clone(),
        project_name: board.project_name().map(str::to_string),
        artifact_type: board.artifact_type(),
        progress: board.progress(),
        general_comment: board.general_comment().saved().to_string(),
        aggregate: board.aggregate(),
        local_aggregate: local
            .then(|| criteria_averages(board.artifacts().iter().map(|a| &**a), &rubric)),
        artifacts: board
            .artifacts()
            .iter()
            .map(|a| ArtifactRow {
                id: a.id.clone(),
                name: a.display_name(),
                reviewed: a.reviewed,
                rating: a.rating,
            })
            .collect(),
    }
}

fn render_aggregate(out: &mut String, title: &str, rubric: &Rubric, aggregate: &AggregateRubric) {
    out.push_str(&format!(
        "{title}: {:.2} {} over {} review(s)\n",
        aggregate.overall_score,
        stars(aggregate.overall_score),
        aggregate.review_count
    ));
    for c in rubric.criteria {
        out.push_str(&format!(
            "  {:<28} {:.2}\n",
            c.name,
            aggregate.average(c.key)
        ));
    }
}

fn render_board(summary: &BoardSummary) -> String {
    let rubric = Rubric::for_type(summary.artifact_type);
    let mut out = format!(
        "{} - {} ({}/{} reviewed)\n\n",
        summary
            .project_name
            .as_deref()
            .unwrap_or(&summary.project_id.0),
        summary.artifact_type.label(),
        summary.progress.reviewed,
        summary.progress.total
    );

    for a in &summary.artifacts {
        let mark = if a.reviewed { "x" } else { " " };
        out.push_str(&format!(
            "[{mark}] {:<24} {:<40} {}\n",
            a.id.0,
            a.name,
            stars(a.rating)
        ));
    }
    out.push('\n');

    render_aggregate(&mut out, "Backend aggregate", &rubric, &summary.aggregate);
    if let Some(local) = &summary.local_aggregate {
        render_aggregate(&mut out, "Local aggregate", &rubric, local);
    }
    if !summary.general_comment.is_empty() {
        out.push_str(&format!("\nGeneral comment: {}\n", summary.general_comment));
    }
    out
}

async fn load_board(
    gateway: HttpGateway,
    project: &str,
    artifact_type: ArtifactType,
    capability: Capability,
) -> Result<ReviewBoard> {
    let gateway: Arc<dyn ReviewGateway> = Arc::new(gateway);
    ReviewBoard::load(gateway, artifact_type, ProjectId::from(project), capability)
        .await
        .with_context(|| format!("Failed to load {} for project {project}", artifact_type.label()))
}

async fn cmd_show(
    gateway: HttpGateway,
    project: &str,
    artifact_type: ArtifactType,
    local: bool,
    json: bool,
) -> Result<()> {
    let board = load_board(gateway, project, artifact_type, Capability::ReadOnly).await?;
    let summary = board_summary(&board, local);
    if json {
        return print_json(&summary);
    }
    print!("{}", render_board(&summary));
    Ok(())
}

// ---------------------------------------------------------------------------
// review
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct ReviewResult {
    artifact_id: ArtifactId,
    saved: bool,
    rating: f64,
    comment: String,
    aggregate: AggregateRubric,
}

async fn authenticated_board(
    gateway: HttpGateway,
    project: &str,
    artifact_type: ArtifactType,
) -> Result<ReviewBoard> {
    let auth = gateway
        .authenticate()
        .await
        .context("Failed to authenticate with the review backend")?;
    info!(user = %auth.user().display_name(), "authenticated");
    if !auth.capability().can_edit() {
        bail!(
            "user {} is not an admin and cannot edit reviews",
            auth.user().display_name()
        );
    }
    load_board(gateway, project, artifact_type, auth.capability()).await
}

async fn cmd_review(
    gateway: HttpGateway,
    project: &str,
    artifact_type: ArtifactType,
    artifact_id: &str,
    scores: &[(String, f64)],
    comment: Option<&str>,
    json: bool,
) -> Result<()> {
    let mut board = authenticated_board(gateway, project, artifact_type).await?;
    let artifact = board
        .artifact(&ArtifactId::from(artifact_id))
        .cloned()
        .with_context(|| format!("No {} with id {artifact_id}", artifact_type.singular()))?;

    let mut session = ReviewSession::for_board(&board);
    let applicable = session.rubric().applicable_keys(&artifact);
    for (key, _) in scores {
        if !applicable.contains(key.as_str()) {
            let known: Vec<_> = applicable.iter().copied().collect();
            bail!(
                "criterion {key} does not apply to this {}; expected one of: {}",
                artifact_type.singular(),
                known.join(", ")
            );
        }
    }

    session.open(artifact);
    for (key, value) in scores {
        session.set_score(key, *value);
    }
    if let Some(text) = comment {
        session.set_comment(text);
    }

    if !session.is_dirty() {
        session.request_close();
        info!("nothing changed; review not submitted");
        let current = board
            .artifact(&ArtifactId::from(artifact_id))
            .cloned()
            .context("artifact disappeared from board")?;
        return report_review(&board, &current, false, json);
    }

    let outcome = session
        .save(&mut board)
        .await
        .context("Failed to save review")?;
    let SaveOutcome::Saved { artifact, refresh } = outcome else {
        bail!("review was not saved");
    };
    refresh.await.context("Aggregate refresh task failed")?;

    report_review(&board, &artifact, true, json)
}

fn report_review(
    board: &ReviewBoard,
    artifact: &rubricdash_core::Artifact,
    saved: bool,
    json: bool,
) -> Result<()> {
    let result = ReviewResult {
        artifact_id: artifact.id.clone(),
        saved,
        rating: artifact.rating,
        comment: artifact.comment.clone(),
        aggregate: board.aggregate(),
    };
    if json {
        return print_json(&result);
    }
    let verb = if saved { "Saved" } else { "Unchanged" };
    println!(
        "{verb} review for {}: {:.2} {}",
        result.artifact_id,
        result.rating,
        stars(result.rating)
    );
    println!(
        "{} aggregate: {:.2} over {} review(s)",
        board.artifact_type().label(),
        result.aggregate.overall_score,
        result.aggregate.review_count
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// comment
// ---------------------------------------------------------------------------

async fn cmd_comment(
    gateway: HttpGateway,
    project: &str,
    artifact_type: ArtifactType,
    text: &str,
    json: bool,
) -> Result<()> {
    let mut board = authenticated_board(gateway, project, artifact_type).await?;
    board.set_general_comment(text);
    if !board.general_comment().is_dirty() {
        info!("general comment unchanged");
    } else {
        board
            .save_general_comment()
            .await
            .context("Failed to save general comment")?;
    }

    if json {
        return print_json(&serde_json::json!({
            "project_id": board.project_id(),
            "artifact_type": artifact_type,
            "general_comment": board.general_comment().saved(),
        }));
    }
    println!("General comment for {} saved.", artifact_type.label());
    Ok(())
}

// ---------------------------------------------------------------------------
// evaluate
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct EvaluationSummary {
    project_id: ProjectId,
    artifact_type: ArtifactType,
    stored: bool,
    saved: bool,
    overall_score: f64,
    criteria: Vec<EvaluationCriterion>,
    general_comment: String,
}

fn evaluation_summary(tracker: &EvaluationTracker, saved: bool) -> EvaluationSummary {
    EvaluationSummary {
        project_id: tracker.project_id().clone(),
        artifact_type: tracker.artifact_type(),
        stored: tracker.is_stored(),
        saved,
        overall_score: tracker.overall_score(),
        criteria: tracker.criteria().to_vec(),
        general_comment: tracker.general_comment().saved().to_string(),
    }
}

fn render_evaluation(summary: &EvaluationSummary) -> String {
    let state = match (summary.saved, summary.stored) {
        (true, _) => "saved",
        (false, true) => "stored",
        (false, false) => "defaults, not yet saved",
    };
    let mut out = format!(
        "{} rubric evaluation ({state})\n",
        summary.artifact_type.label()
    );
    for c in &summary.criteria {
        out.push_str(&format!("  {:<28} {} {:.1}\n", c.name, stars(c.score), c.score));
        if !c.description.is_empty() {
            out.push_str(&format!("  {:<28} {}\n", "", c.description));
        }
        if let Some(comment) = &c.comment {
            out.push_str(&format!("  {:<28} > {comment}\n", ""));
        }
    }
    out.push_str(&format!(
        "Overall rubric score: {:.1}/{MAX_SCORE}\n",
        summary.overall_score
    ));
    if !summary.general_comment.is_empty() {
        out.push_str(&format!("General comment: {}\n", summary.general_comment));
    }
    out
}

/// Apply score and comment edits, rejecting names the evaluation lacks.
fn apply_evaluation_edits(
    tracker: &mut EvaluationTracker,
    scores: &[(String, f64)],
    notes: &[(String, String)],
) -> Result<()> {
    let names = scores
        .iter()
        .map(|(name, _)| name)
        .chain(notes.iter().map(|(name, _)| name));
    for name in names {
        if tracker.criterion(name).is_none() {
            let known: Vec<_> = tracker.criteria().iter().map(|c| c.name.as_str()).collect();
            bail!(
                "criterion {name:?} is not part of this evaluation; expected one of: {}",
                known.join(", ")
            );
        }
    }
    for (name, value) in scores {
        tracker.set_score(name, *value);
    }
    for (name, text) in notes {
        tracker.set_comment(name, text);
    }
    Ok(())
}

async fn cmd_evaluate(
    gateway: HttpGateway,
    project: &str,
    artifact_type: ArtifactType,
    scores: &[(String, f64)],
    notes: &[(String, String)],
    general_comment: Option<&str>,
    json: bool,
) -> Result<()> {
    let auth = gateway
        .authenticate()
        .await
        .context("Failed to authenticate with the review backend")?;
    let editing = !scores.is_empty() || !notes.is_empty() || general_comment.is_some();
    if editing && !auth.capability().can_edit() {
        bail!(
            "user {} is not an admin and cannot edit rubric evaluations",
            auth.user().display_name()
        );
    }

    let gateway: Arc<dyn ReviewGateway> = Arc::new(gateway);
    let mut tracker =
        EvaluationTracker::load(gateway, ProjectId::from(project), artifact_type, &auth)
            .await
            .with_context(|| {
                format!(
                    "Failed to load the {} rubric evaluation for project {project}",
                    artifact_type.label()
                )
            })?;

    apply_evaluation_edits(&mut tracker, scores, notes)?;
    let mut saved = false;
    if tracker.is_dirty() {
        saved = tracker
            .save()
            .await
            .context("Failed to save rubric evaluation")?;
    } else if editing {
        info!("rubric evaluation unchanged");
    }

    if let Some(text) = general_comment {
        tracker.set_general_comment(text);
        if tracker.general_comment().is_dirty() {
            tracker
                .save_general_comment()
                .await
                .context("Failed to save evaluation general comment")?;
        }
    }

    let summary = evaluation_summary(&tracker, saved);
    if json {
        return print_json(&summary);
    }
    print!("{}", render_evaluation(&summary));
    Ok(())
}
