mod config;

use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use arazzo_engine::{
    Branch, DanglingReference, DocumentFormat, EditOperation, EditorState, SessionHandle, check_document, connections, parse_document_file,
    render_document,
};
use arazzo_types::{ArazzoDocument, Step};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use crate::config::{ConfigError, DEFAULT_LOG_LEVEL, StudioConfig};

/// Inspect and edit Arazzo workflow documents.
#[derive(Parser, Debug)]
#[command(name = "arazzo-studio", version, about)]
struct Args {
    /// Configuration file (defaults to $ARAZZO_STUDIO_CONFIG or the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Workflow to edit; defaults to the first workflow of the document
    #[arg(long, global = true)]
    workflow: Option<String>,

    /// Output format for the edited document (yaml or json)
    #[arg(long, global = true)]
    format: Option<DocumentFormat>,

    /// Write the edited document back to FILE instead of stdout
    #[arg(long, global = true)]
    in_place: bool,

    /// Arazzo document in YAML or JSON
    file: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List workflows, steps, edges, and integrity findings
    Inspect,
    /// Append a step; the identifier is generated when omitted
    AddStep {
        step_id: Option<String>,
        #[arg(long)]
        operation_id: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Remove a step and the branch actions targeting it
    DeleteStep { step_id: String },
    /// Rename a step and rewrite every reference to it
    RenameStep { old_id: String, new_id: String },
    /// Add a goto from SOURCE's success branch to TARGET
    Connect { source_id: String, target_id: String },
    /// Remove the gotos from SOURCE's success branch to TARGET
    Disconnect { source_id: String, target_id: String },
    /// Insert a new step on the SOURCE -> TARGET edge
    InsertOnEdge {
        source_id: String,
        target_id: String,
        step_id: String,
    },
    /// Move the step at FROM to TO (zero-based)
    ReorderStep { from: usize, to: usize },
    /// Rename a workflow; references from other workflows are reported, not rewritten
    RenameWorkflow { old_id: String, new_id: String },
}

impl Command {
    /// Maps the subcommand onto an edit operation; `None` for read-only commands.
    fn into_operation(self) -> Option<EditOperation> {
        let operation = match self {
            Self::Inspect => return None,
            Self::AddStep {
                step_id,
                operation_id,
                description,
            } => {
                let mut step = Step::new(step_id.unwrap_or_default());
                step.operation_id = operation_id;
                step.description = description;
                EditOperation::AddStep(step)
            }
            Self::DeleteStep { step_id } => EditOperation::DeleteStep { step_id },
            Self::RenameStep { old_id, new_id } => EditOperation::RenameStep { old_id, new_id },
            Self::Connect { source_id, target_id } => EditOperation::AddConnection { source_id, target_id },
            Self::Disconnect { source_id, target_id } => EditOperation::DeleteConnection { source_id, target_id },
            Self::InsertOnEdge {
                source_id,
                target_id,
                step_id,
            } => EditOperation::InsertStepOnEdge {
                step: Step::new(step_id),
                source_id,
                target_id,
            },
            Self::ReorderStep { from, to } => EditOperation::ReorderStep { from, to },
            Self::RenameWorkflow { old_id, new_id } => EditOperation::RenameWorkflow { old_id, new_id },
        };
        Some(operation)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = match StudioConfig::load(args.config.as_deref()) {
        Ok(config) => {
            init_tracing(&config.log_level);
            config
        }
        Err(ConfigError::Parse { path, source }) => {
            init_tracing(DEFAULT_LOG_LEVEL);
            warn!(path = %path.display(), error = %source, "Failed to parse configuration; using defaults");
            StudioConfig::default()
        }
        Err(error) => return Err(error.into()),
    };

    run(args, config).await
}

fn init_tracing(default_level: &str) {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| default_level.into());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

async fn run(args: Args, config: StudioConfig) -> Result<()> {
    let document = parse_document_file(&args.file)?;
    let (session, task) = SessionHandle::spawn(EditorState::default(), config.engine.clone());

    let loaded = session
        .submit(EditOperation::LoadDocument(document))
        .await
        .with_context(|| format!("document {} was rejected", args.file.display()))?;
    report_warnings(&loaded.warnings);

    let mut baseline = loaded.number;
    if let Some(workflow_id) = args.workflow.clone() {
        let activated = session
            .submit(EditOperation::SetActiveWorkflow { workflow_id })
            .await
            .context("failed to select workflow")?;
        baseline = activated.number;
    }

    let Some(operation) = args.command.into_operation() else {
        let snapshot = session.snapshot().await?;
        print!("{}", describe_document(&snapshot.state));
        return Ok(());
    };

    let operation_name = operation.name();
    let revision = session
        .submit(operation)
        .await
        .with_context(|| format!("{operation_name} failed"))?;
    report_warnings(&revision.warnings);

    let format = match (args.format, args.in_place) {
        (Some(format), _) => format,
        (None, true) => DocumentFormat::from_path(&args.file),
        (None, false) => config.output_format,
    };
    let rendered = render_document(&revision.state.document, format)?;

    if args.in_place {
        if revision.number > baseline {
            fs::write(&args.file, rendered).with_context(|| format!("failed to write {}", args.file.display()))?;
            info!(path = %args.file.display(), operation = operation_name, "document updated");
        } else {
            info!(operation = operation_name, "edit changed nothing; file left untouched");
        }
    } else {
        print!("{rendered}");
    }

    drop(session);
    task.await.context("editing session panicked")?;
    Ok(())
}

fn report_warnings(warnings: &[DanglingReference]) {
    for warning in warnings {
        eprintln!("warning: {warning}");
    }
}

/// Plain-text summary used by `inspect`.
fn describe_document(state: &EditorState) -> String {
    let document: &ArazzoDocument = &state.document;
    let mut lines = vec![format!("{} (version {}, arazzo {})", document.info.title, document.info.version, document.arazzo)];

    for source in &document.source_descriptions {
        lines.push(format!("source {} -> {}", source.name, source.url));
    }

    for (index, workflow) in document.workflows.iter().enumerate() {
        let marker = if state.active_workflow == Some(index) { " (active)" } else { "" };
        lines.push(format!("workflow {}{marker}: {} step(s)", workflow.workflow_id, workflow.steps.len()));
        for step in &workflow.steps {
            let target = step
                .operation_id
                .as_deref()
                .or(step.operation_path.as_deref())
                .map(|operation| format!(" [{operation}]"))
                .or_else(|| step.workflow_id.as_deref().map(|workflow_id| format!(" [workflow {workflow_id}]")))
                .unwrap_or_default();
            lines.push(format!("  step {}{target}", step.step_id));
        }
        for edge in connections(workflow) {
            let branch = match edge.branch {
                Branch::Success => "success",
                Branch::Failure => "failure",
            };
            lines.push(format!("  {} -> {} ({branch} {}, {})", edge.source, edge.target, edge.kind, edge.name));
        }
    }

    let report = check_document(document);
    if report.is_clean() {
        lines.push("integrity: clean".to_string());
    } else {
        for workflow_id in &report.duplicate_workflow_ids {
            lines.push(format!("integrity: duplicate workflow id {workflow_id}"));
        }
        for (workflow_id, workflow_report) in &report.workflows {
            for step_id in &workflow_report.duplicate_step_ids {
                lines.push(format!("integrity: workflow {workflow_id} has duplicate step id {step_id}"));
            }
        }
        for reference in report.dangling() {
            lines.push(format!("integrity: {reference}"));
        }
    }

    lines.push(String::new());
    lines.join("\n")
}
