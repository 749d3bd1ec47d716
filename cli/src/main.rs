//! dompage CLI - plan and render fragment manifests

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use dompage::render::DocumentWriter;
use dompage::{
    plan_fragments, DocumentCursor, DomPage, FontFaceDescriptor, FontRegistry, FontResolver,
    FragmentListRasterizer, FsFontLoader, Margins, PageBreakPlan, PageSize, PagedDocument,
    PagingMode, RenderOptions, RenderSource,
};

#[derive(Parser)]
#[command(name = "dompage")]
#[command(version)]
#[command(about = "Paginate rasterized DOM fragments onto document pages", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Plan page breaks for a fragment manifest without drawing
    Plan {
        /// Fragment manifest (JSON)
        #[arg(value_name = "MANIFEST")]
        manifest: PathBuf,

        #[command(flatten)]
        layout: LayoutArgs,

        /// Print the plan as JSON
        #[arg(long)]
        json: bool,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,
    },

    /// Render a fragment manifest into a paged document
    Render {
        /// Fragment manifest (JSON)
        #[arg(value_name = "MANIFEST")]
        manifest: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        #[command(flatten)]
        layout: LayoutArgs,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,
    },

    /// Load font faces and report which ones resolved
    Fonts {
        /// Font face descriptors (JSON array)
        #[arg(value_name = "FONTS")]
        fonts: PathBuf,

        /// Per-face load timeout in milliseconds
        #[arg(long, env = "DOMPAGE_FONT_TIMEOUT_MS", default_value = "5000")]
        font_timeout_ms: u64,
    },

    /// Show version information
    Version,
}

/// Layout flags shared by `plan` and `render`.
#[derive(Args)]
struct LayoutArgs {
    /// Paging mode (auto, none)
    #[arg(long, env = "DOMPAGE_PAGING", default_value = "auto")]
    paging: PagingMode,

    /// Page size (a4, letter, or WIDTHxHEIGHT in points)
    #[arg(long, default_value = "a4")]
    page_size: PageSize,

    /// Uniform page margin in points
    #[arg(long, default_value = "0")]
    margin: f64,

    /// Points per rasterizer pixel
    #[arg(long)]
    scale: Option<f64>,

    /// Output width in points
    #[arg(long)]
    width: Option<f64>,

    /// Rasterizer window width in pixels
    #[arg(long)]
    window_width: Option<f64>,

    /// Page to start on; missing pages are added first
    #[arg(long, default_value = "0")]
    start_page: usize,

    /// Vertical offset on the start page, in points
    #[arg(long, default_value = "0")]
    y_offset: f64,

    /// Font face descriptors (JSON array)
    #[arg(long, value_name = "FILE")]
    fonts: Option<PathBuf>,

    /// Per-face font load timeout in milliseconds
    #[arg(long, env = "DOMPAGE_FONT_TIMEOUT_MS", default_value = "5000")]
    font_timeout_ms: u64,

    /// Map draw instructions on a single thread
    #[arg(long)]
    sequential: bool,
}

impl LayoutArgs {
    fn options(&self) -> Result<RenderOptions, Box<dyn std::error::Error>> {
        let mut options = RenderOptions::new()
            .with_paging(self.paging)
            .with_page_size(self.page_size)
            .with_margins(Margins::uniform(self.margin))
            .with_font_timeout(Duration::from_millis(self.font_timeout_ms))
            .with_parallel(!self.sequential);

        if let Some(scale) = self.scale {
            options = options.with_scale(scale);
        }
        if let Some(width) = self.width {
            options = options.with_width(width);
        }
        if let Some(window) = self.window_width {
            options = options.with_window_width(window);
        }
        if let Some(path) = &self.fonts {
            options = options.with_font_faces(load_faces(path)?);
        }
        Ok(options)
    }

    fn start_cursor(&self) -> DocumentCursor {
        DocumentCursor::new(self.start_page, self.y_offset)
    }

    /// Document with pages up to the start page and the cursor placed.
    fn document(&self) -> Result<PagedDocument, Box<dyn std::error::Error>> {
        let mut doc = PagedDocument::new(self.page_size);
        while doc.page_count() <= self.start_page {
            doc.add_page()?;
        }
        doc.set_cursor(self.start_cursor())?;
        Ok(doc)
    }

    fn font_dir(&self) -> Option<PathBuf> {
        self.fonts.as_deref().and_then(parent_dir)
    }
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Plan {
            manifest,
            layout,
            json,
            compact,
        } => cmd_plan(&manifest, &layout, json, compact),
        Commands::Render {
            manifest,
            output,
            layout,
            compact,
        } => cmd_render(&manifest, output.as_deref(), &layout, compact),
        Commands::Fonts {
            fonts,
            font_timeout_ms,
        } => cmd_fonts(&fonts, font_timeout_ms),
        Commands::Version => {
            cmd_version();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn cmd_plan(
    manifest: &Path,
    layout: &LayoutArgs,
    json: bool,
    compact: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    log::debug!("Planning {}", manifest.display());
    let rasterizer = FragmentListRasterizer::from_path(manifest)?;
    let options = layout.options()?;
    let plan = plan_fragments(
        rasterizer.fragments(),
        &options,
        layout.page_size,
        layout.start_cursor(),
    )?;

    if json {
        let out = if compact {
            serde_json::to_string(&plan)?
        } else {
            serde_json::to_string_pretty(&plan)?
        };
        println!("{}", out);
    } else {
        print_plan(&plan);
    }
    Ok(())
}

fn print_plan(plan: &PageBreakPlan) {
    println!("{}", "Page Break Plan".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    println!("{}: {}", "Mode".bold(), plan.mode);
    println!("{}: {:.4} pt/px", "Scale".bold(), plan.scale);
    println!("{}: {}", "Entries".bold(), plan.len());
    println!("{}: {}", "Pages".bold(), plan.pages_spanned());

    let (first, last) = (
        plan.start_cursor.page_index,
        plan.final_cursor.page_index,
    );
    for page in first..=last {
        println!();
        println!("{} {}", "Page".green().bold(), page);
        for entry in plan.entries_on_page(page) {
            let slice = match entry.clip {
                Some(clip) => format!(" rows {:.1}..{:.1}", clip.top_px, clip.bottom_px),
                None => String::new(),
            };
            println!(
                "  {} #{:<4} y={:<9.2} h={:.2}{}",
                "├─".dimmed(),
                entry.fragment_index,
                entry.y,
                entry.height,
                slice.dimmed()
            );
        }
    }

    println!();
    println!(
        "{}: page {}, y={:.2}",
        "Final cursor".bold(),
        plan.final_cursor.page_index,
        plan.final_cursor.y
    );
}

fn cmd_render(
    manifest: &Path,
    output: Option<&Path>,
    layout: &LayoutArgs,
    compact: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    log::debug!("Rendering {}", manifest.display());
    let rasterizer = Arc::new(FragmentListRasterizer::from_path(manifest)?);
    let options = layout.options()?;
    let mut doc = layout.document()?;

    let mut builder = DomPage::new().with_options(options);
    if let Some(dir) = layout.font_dir() {
        builder = builder.with_font_dir(dir);
    }

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(format!("Rendering {}...", manifest.display()));

    let source = RenderSource::Node(manifest.display().to_string());
    let outcome = builder.render(rasterizer, &source, &mut doc);
    pb.finish_and_clear();
    let report = outcome?;

    for (key, reason) in &report.fonts.failed {
        eprintln!("{} {}: {}", "Font skipped".yellow(), key, reason);
    }

    let json = doc.to_json(!compact)?;
    if let Some(path) = output {
        fs::write(path, &json)?;
        println!("{} {}", "Saved to".green(), path.display());
        println!(
            "  {} {} pages ({} added), {} draws",
            "└─".dimmed(),
            doc.page_count(),
            report.pages_added,
            report.draw_calls
        );
    } else {
        println!("{}", json);
    }
    Ok(())
}

fn cmd_fonts(fonts: &Path, font_timeout_ms: u64) -> Result<(), Box<dyn std::error::Error>> {
    let faces = load_faces(fonts)?;
    log::debug!("Resolving {} font faces from {}", faces.len(), fonts.display());

    let mut loader = FsFontLoader::new();
    if let Some(dir) = parent_dir(fonts) {
        loader = loader.with_base_dir(dir);
    }
    let registry = FontRegistry::new();
    let report = FontResolver::new(Arc::new(loader))
        .with_timeout(Duration::from_millis(font_timeout_ms))
        .resolve(&faces, &registry);

    println!("{}", "Font Faces".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    for (key, handle) in &report.loaded {
        let size = registry.data(*handle).map(|d| d.len()).unwrap_or(0);
        println!("  {} {} ({} bytes)", "✓".green(), key, size);
    }
    for (key, reason) in &report.failed {
        println!("  {} {}: {}", "✗".red(), key, reason.dimmed());
    }
    println!();
    println!(
        "{}: {} loaded, {} failed",
        "Total".bold(),
        report.loaded.len(),
        report.failed.len()
    );
    Ok(())
}

fn cmd_version() {
    println!("{} {}", "dompage".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("DOM fragment pagination tool");
    println!();
    println!("License: MIT");
}

fn load_faces(path: &Path) -> Result<Vec<FontFaceDescriptor>, Box<dyn std::error::Error>> {
    let json = fs::read_to_string(path)?;
    let faces: Vec<FontFaceDescriptor> = serde_json::from_str(&json)
        .map_err(|e| format!("Invalid font descriptors in {}: {}", path.display(), e))?;
    Ok(faces)
}

fn parent_dir(path: &Path) -> Option<PathBuf> {
    path.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout(args: &[&str]) -> LayoutArgs {
        #[derive(Parser)]
        struct Wrapper {
            #[command(flatten)]
            layout: LayoutArgs,
        }
        let mut argv = vec!["dompage"];
        argv.extend_from_slice(args);
        Wrapper::parse_from(argv).layout
    }

    #[test]
    fn test_layout_defaults() {
        let args = layout(&[]);
        let options = args.options().unwrap();
        assert_eq!(options.page_size, PageSize::a4());
        assert!(options.parallel);
        assert!(options.scale.is_none());
    }

    #[test]
    fn test_layout_flags() {
        let args = layout(&[
            "--paging",
            "manual",
            "--page-size",
            "200x750",
            "--margin",
            "10",
            "--scale",
            "0.5",
            "--sequential",
        ]);
        let options = args.options().unwrap();
        assert_eq!(options.paging, PagingMode::None);
        assert_eq!(options.page_size, PageSize::new(200.0, 750.0));
        assert_eq!(options.margins, Margins::uniform(10.0));
        assert_eq!(options.scale, Some(0.5));
        assert!(!options.parallel);
    }

    #[test]
    fn test_start_page_document() {
        let args = layout(&["--start-page", "2", "--y-offset", "40"]);
        let doc = args.document().unwrap();
        assert_eq!(doc.page_count(), 3);
        assert_eq!(doc.current_cursor(), DocumentCursor::new(2, 40.0));
    }

    #[test]
    fn test_load_faces() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fonts.json");
        fs::write(
            &path,
            r#"[{"family": "Roboto", "weight": "bold", "src": [{"url": "Roboto-Bold.ttf"}]}]"#,
        )
        .unwrap();

        let faces = load_faces(&path).unwrap();
        assert_eq!(faces.len(), 1);
        assert_eq!(parent_dir(&path).as_deref(), Some(dir.path()));
    }

    #[test]
    fn test_plan_and_render_commands() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = dir.path().join("fragments.json");
        fs::write(
            &manifest,
            r#"{"fragments": [{"width": 200, "height": 500}, {"width": 200, "height": 500}]}"#,
        )
        .unwrap();
        let args = layout(&["--page-size", "200x750", "--scale", "1"]);

        cmd_plan(&manifest, &args, true, true).unwrap();

        let output = dir.path().join("document.json");
        cmd_render(&manifest, Some(&output), &args, false).unwrap();
        let doc: serde_json::Value = serde_json::from_str(&fs::read_to_string(&output).unwrap())
            .unwrap();
        assert_eq!(doc["pages"].as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn test_plan_command_rejects_negative_height() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = dir.path().join("fragments.json");
        fs::write(&manifest, r#"{"fragments": [{"width": 200, "height": -5}]}"#).unwrap();

        let err = cmd_plan(&manifest, &layout(&[]), false, false).unwrap_err();
        assert!(err.to_string().contains("invalid size"));
    }
}
