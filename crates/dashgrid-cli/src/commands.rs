//! Subcommand implementations.

use std::io::Write;
use std::path::Path;

use dashgrid_layout::{
    Breakpoint, DashboardDocument, DashboardSpec, LayoutEngine, LayoutOperation, PixelRect,
    RenderContent, RenderItem, RowId,
};
use serde::Serialize;
use tracing::{debug, info};

use crate::cli::{ApplyArgs, BreakpointsArgs, RenderArgs, ValidateArgs};
use crate::config::CliConfig;
use crate::error::{CliError, Result};

pub fn load_dashboard(path: &Path) -> Result<DashboardDocument> {
    let content = std::fs::read_to_string(path).map_err(|err| CliError::read(path, err))?;
    let spec: DashboardSpec = serde_json::from_str(&content)?;
    let document = DashboardDocument::from_spec(spec)?;
    debug!(
        target: "dashgrid.cli",
        path = %path.display(),
        rows = document.row_count(),
        panels = document.panels().count(),
        "loaded dashboard"
    );
    Ok(document)
}

// ---------------------------------------------------------------------------
// render
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct RenderReport {
    breakpoint: Breakpoint,
    columns: u32,
    items: Vec<RenderRecord>,
}

#[derive(Debug, Serialize)]
struct RenderRecord {
    id: String,
    row: String,
    x: u32,
    y: u32,
    width: u32,
    height: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pixels: Option<PixelRect>,
    content: ContentRecord,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentRecord {
    RowHeader {
        title: String,
        collapsible: bool,
        open: bool,
    },
    Panel {
        key: String,
        kind: String,
        name: String,
    },
    NewPanel,
    Unresolved {
        error: String,
    },
}

impl From<&RenderContent> for ContentRecord {
    fn from(content: &RenderContent) -> Self {
        match content {
            RenderContent::RowHeader {
                title,
                collapsible,
                is_open,
            } => Self::RowHeader {
                title: title.clone(),
                collapsible: *collapsible,
                open: *is_open,
            },
            RenderContent::Panel { key, definition } => Self::Panel {
                key: key.clone(),
                kind: definition.kind.clone(),
                name: definition.display.name.clone(),
            },
            RenderContent::NewPanel => Self::NewPanel,
            RenderContent::Unresolved(err) => Self::Unresolved {
                error: err.to_string(),
            },
        }
    }
}

impl From<&RenderItem> for RenderRecord {
    fn from(item: &RenderItem) -> Self {
        Self {
            id: item.id.to_string(),
            row: item.row_id.to_string(),
            x: item.grid.x,
            y: item.grid.y,
            width: item.grid.width,
            height: item.grid.height,
            pixels: item.pixels,
            content: ContentRecord::from(&item.content),
        }
    }
}

impl ContentRecord {
    fn summary(&self) -> String {
        match self {
            Self::RowHeader { title, open, .. } => {
                format!("[row] {title} ({})", if *open { "open" } else { "closed" })
            }
            Self::Panel { key, kind, .. } => format!("{key} <{kind}>"),
            Self::NewPanel => "(new panel)".to_string(),
            Self::Unresolved { error } => format!("!! {error}"),
        }
    }
}

pub fn run_render(
    args: &RenderArgs,
    config: &CliConfig,
    json: bool,
    out: &mut dyn Write,
) -> Result<()> {
    let document = load_dashboard(&args.dashboard)?;
    let mut engine = LayoutEngine::new(document, config.grid.clone())?;
    for row in &args.toggle_rows {
        engine.toggle_row(&RowId::from(row.as_str()))?;
    }

    let (breakpoint, items) = match args.width {
        Some(width) => {
            let items = engine.render_for_width(width)?;
            let breakpoint = config
                .grid
                .classify_width(width)
                .unwrap_or(Breakpoint::Lg);
            (breakpoint, items)
        }
        None => {
            let breakpoint = args.breakpoint.unwrap_or(Breakpoint::Lg);
            (breakpoint, engine.render(breakpoint)?)
        }
    };
    let report = RenderReport {
        breakpoint,
        columns: config.grid.columns(breakpoint).unwrap_or_default(),
        items: items.iter().map(RenderRecord::from).collect(),
    };

    if json {
        serde_json::to_writer_pretty(&mut *out, &report)?;
        writeln!(out)?;
        return Ok(());
    }
    writeln!(
        out,
        "breakpoint {} ({} columns)",
        report.breakpoint, report.columns
    )?;
    for item in &report.items {
        write!(
            out,
            "{:<12} {:<16} x={:<3} y={:<3} w={:<3} h={:<3} {}",
            item.row,
            item.id,
            item.x,
            item.y,
            item.width,
            item.height,
            item.content.summary()
        )?;
        if let Some(px) = item.pixels {
            write!(
                out,
                " @ {:.0},{:.0} {:.0}x{:.0}",
                px.left, px.top, px.width, px.height
            )?;
        }
        writeln!(out)?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// validate
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct ValidationReport {
    valid: bool,
    panel_errors: Vec<String>,
    unresolved: Vec<UnresolvedRecord>,
}

#[derive(Debug, Serialize)]
struct UnresolvedRecord {
    row: String,
    item: String,
    error: String,
}

pub fn run_validate(
    args: &ValidateArgs,
    config: &CliConfig,
    json: bool,
    out: &mut dyn Write,
) -> Result<()> {
    let document = load_dashboard(&args.dashboard)?.with_design_columns(config.grid.design_columns);
    document.validate_layout()?;

    let registry = config.registry()?;
    let failures = if args.all {
        registry.validate_all(&document)
    } else {
        registry.validate(&document).err().into_iter().collect()
    };
    let unresolved: Vec<UnresolvedRecord> = document
        .integrity_report()
        .into_iter()
        .map(|issue| UnresolvedRecord {
            row: issue.row.to_string(),
            item: issue.item.to_string(),
            error: issue.error.to_string(),
        })
        .collect();
    let report = ValidationReport {
        valid: failures.is_empty(),
        panel_errors: failures.iter().map(ToString::to_string).collect(),
        unresolved,
    };

    if json {
        serde_json::to_writer_pretty(&mut *out, &report)?;
        writeln!(out)?;
    } else {
        for message in &report.panel_errors {
            writeln!(out, "error: {message}")?;
        }
        for issue in &report.unresolved {
            writeln!(out, "warning: {} in row {}: {}", issue.item, issue.row, issue.error)?;
        }
        if report.valid {
            writeln!(out, "ok")?;
        }
    }

    let count = failures.len();
    match failures.into_iter().next() {
        Some(first) => Err(CliError::Validation { count, first }),
        None => Ok(()),
    }
}

// ---------------------------------------------------------------------------
// apply
// ---------------------------------------------------------------------------

pub fn run_apply(
    args: &ApplyArgs,
    config: &CliConfig,
    json: bool,
    out: &mut dyn Write,
) -> Result<()> {
    let document = load_dashboard(&args.dashboard)?;
    let content = std::fs::read_to_string(&args.ops).map_err(|err| CliError::read(&args.ops, err))?;
    let operations: Vec<LayoutOperation> = serde_json::from_str(&content)?;

    let mut engine = LayoutEngine::new(document, config.grid.clone())?;
    if args.check_panels {
        engine = engine.with_registry(config.registry()?)?;
    }
    engine.set_edit_mode(true);
    for (index, operation) in operations.iter().enumerate() {
        let outcome = engine
            .apply(operation)
            .map_err(|source| CliError::OperationRejected { index, source })?;
        debug!(
            target: "dashgrid.cli",
            index,
            kind = ?outcome.kind,
            version = outcome.document.version(),
            "operation applied"
        );
    }
    let version = engine.document().version();
    info!(
        target: "dashgrid.cli",
        operations = operations.len(),
        version,
        "layout edited"
    );

    let spec = engine.document().to_spec();
    match &args.output {
        Some(path) => {
            let rendered = serde_json::to_string_pretty(&spec)?;
            std::fs::write(path, rendered + "\n")?;
            if json {
                serde_json::to_writer(
                    &mut *out,
                    &serde_json::json!({
                        "status": "ok",
                        "operations": operations.len(),
                        "version": version,
                        "output": path.display().to_string(),
                    }),
                )?;
                writeln!(out)?;
            } else {
                writeln!(
                    out,
                    "applied {} operation(s), wrote {}",
                    operations.len(),
                    path.display()
                )?;
            }
        }
        None => {
            serde_json::to_writer_pretty(&mut *out, &spec)?;
            writeln!(out)?;
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// breakpoints
// ---------------------------------------------------------------------------

pub fn run_breakpoints(
    args: &BreakpointsArgs,
    config: &CliConfig,
    json: bool,
    out: &mut dyn Write,
) -> Result<()> {
    let table = &config.grid.breakpoints;
    if let Some(width) = args.width {
        let breakpoint = config.grid.classify_width(width);
        let columns = breakpoint.and_then(|bp| config.grid.columns(bp));
        if json {
            serde_json::to_writer(
                &mut *out,
                &serde_json::json!({
                    "width": width,
                    "breakpoint": breakpoint,
                    "columns": columns,
                }),
            )?;
            writeln!(out)?;
        } else if let (Some(breakpoint), Some(columns)) = (breakpoint, columns) {
            writeln!(out, "{width}px -> {breakpoint} ({columns} columns)")?;
        }
        return Ok(());
    }

    if json {
        serde_json::to_writer_pretty(&mut *out, table)?;
        writeln!(out)?;
        return Ok(());
    }
    for spec in table.specs().iter().rev() {
        writeln!(
            out,
            "{:<4} >= {:>5}px  {:>2} columns{}",
            spec.breakpoint,
            spec.min_width_px,
            spec.columns,
            if table.is_narrowest(spec.breakpoint) {
                "  (stacked)"
            } else {
                ""
            }
        )?;
    }
    Ok(())
}
