use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::Context;
use clap::Parser;

use snipshot::config::{EditorConfig, ImageEncoding, Tool};
use snipshot::domain::{Point, Size};
use snipshot::export::{self, ExportSink, FileSink};
use snipshot::session::messages::{ToolContext, Viewport};
use snipshot::session::state::EditorSession;
use snipshot::BaseImage;

/// Four comma separated numbers
#[derive(Debug, Clone, Copy)]
struct Quad([f32; 4]);

impl FromStr for Quad {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let values: Vec<f32> = s
            .split(',')
            .map(|v| v.trim().parse::<f32>())
            .collect::<Result<_, _>>()
            .map_err(|e| format!("invalid number in '{}': {}", s, e))?;
        let values: [f32; 4] = values
            .try_into()
            .map_err(|_| format!("expected four values in '{}'", s))?;
        Ok(Quad(values))
    }
}

/// `X,Y`
#[derive(Debug, Clone, Copy)]
struct At(Point);

impl FromStr for At {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (x, y) = s
            .split_once(',')
            .ok_or_else(|| format!("expected X,Y in '{}'", s))?;
        let parse = |v: &str| {
            v.trim()
                .parse::<f32>()
                .map_err(|e| format!("invalid number in '{}': {}", s, e))
        };
        Ok(At(Point::new(parse(x)?, parse(y)?)))
    }
}

/// `X,Y,CONTENT`
#[derive(Debug, Clone)]
struct Label {
    at: Point,
    content: String,
}

impl FromStr for Label {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(3, ',');
        let (Some(x), Some(y), Some(content)) = (parts.next(), parts.next(), parts.next()) else {
            return Err(format!("expected X,Y,TEXT in '{}'", s));
        };
        let At(at) = format!("{},{}", x, y).parse::<At>()?;
        Ok(Label {
            at,
            content: content.to_string(),
        })
    }
}

#[derive(Parser, Debug)]
#[command(version, about = "Annotate a screenshot and write the flattened image")]
struct Cli {
    /// Image to annotate, or `-` to read it from stdin
    input: PathBuf,

    /// Output file, or `-` for PNG on stdout; defaults to a timestamped name next to the input
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Read coordinates as positions in a view of this size showing the image
    #[arg(long, value_name = "W,H")]
    view: Option<At>,

    /// Show the image at actual size inside `--view` instead of fitting it
    #[arg(long)]
    actual_size: bool,

    /// Device pixels per logical unit of the input image
    #[arg(long, default_value_t = 1.0)]
    scale: f32,

    #[arg(long = "rect", value_name = "X,Y,W,H")]
    rects: Vec<Quad>,

    #[arg(long = "oval", value_name = "X,Y,W,H")]
    ovals: Vec<Quad>,

    #[arg(long = "highlight", value_name = "X,Y,W,H")]
    highlights: Vec<Quad>,

    /// Region to pixelate
    #[arg(long = "pixelate", value_name = "X,Y,W,H")]
    pixelate: Vec<Quad>,

    #[arg(long = "line", value_name = "X1,Y1,X2,Y2")]
    lines: Vec<Quad>,

    #[arg(long = "arrow", value_name = "X1,Y1,X2,Y2")]
    arrows: Vec<Quad>,

    /// Numbered badge centered on the point
    #[arg(long = "badge", value_name = "X,Y")]
    badges: Vec<At>,

    #[arg(long = "text", value_name = "X,Y,TEXT")]
    texts: Vec<Label>,

    /// Pixelation block size in image pixels
    #[arg(long)]
    block: Option<u32>,

    /// JPEG quality (1-100)
    #[arg(long)]
    quality: Option<u8>,

    /// Downsample high-density images to their logical size
    #[arg(long)]
    downsample: bool,

    /// Read settings from this file instead of the user config
    #[arg(long)]
    config: Option<PathBuf>,
}

/// Add the click default of `tool` at a view position
fn mark(session: &mut EditorSession, ctx: &ToolContext, tool: Tool, viewport: &Viewport, at: Point) {
    let ctx = ctx.clone().with_tool(tool);
    if session.place_at(viewport.to_author(at), &ctx).is_none() {
        log::warn!("Could not place {:?} at {:?}", tool, at);
    }
}

/// Add a drawable spanning two view positions
fn span(session: &mut EditorSession, ctx: &ToolContext, tool: Tool, viewport: &Viewport, quad: &Quad) {
    let Quad([x1, y1, x2, y2]) = *quad;
    let ctx = ctx.clone().with_tool(tool);
    let from = viewport.to_author(Point::new(x1, y1));
    let to = viewport.to_author(Point::new(x2, y2));
    if session.place(from, to, &ctx).is_none() {
        log::warn!("Could not place {:?} at {:?}", tool, quad);
    }
}

fn place_annotations(session: &mut EditorSession, cli: &Cli, ctx: &ToolContext, viewport: &Viewport) {
    let rect_tools = [
        (Tool::Rectangle, &cli.rects),
        (Tool::Oval, &cli.ovals),
        (Tool::Highlight, &cli.highlights),
        (Tool::Blur, &cli.pixelate),
    ];
    for (tool, quads) in rect_tools {
        for Quad([x, y, w, h]) in quads {
            span(session, ctx, tool, viewport, &Quad([*x, *y, x + w, y + h]));
        }
    }

    for (arrow_head, quads) in [(false, &cli.lines), (true, &cli.arrows)] {
        let ctx = ToolContext {
            arrow_head,
            ..ctx.clone()
        };
        for quad in quads {
            span(session, &ctx, Tool::Line, viewport, quad);
        }
    }

    for At(at) in &cli.badges {
        mark(session, ctx, Tool::Badge, viewport, *at);
    }

    for label in &cli.texts {
        let ctx = ToolContext {
            default_text: label.content.clone(),
            ..ctx.clone()
        };
        mark(session, &ctx, Tool::Text, viewport, label.at);
    }
}

fn is_stdio(path: &Path) -> bool {
    path.as_os_str() == "-"
}

fn load_base(cli: &Cli) -> anyhow::Result<BaseImage> {
    if !is_stdio(&cli.input) {
        return BaseImage::open(&cli.input, cli.scale);
    }
    let mut bytes = Vec::new();
    std::io::stdin()
        .read_to_end(&mut bytes)
        .context("reading image from stdin")?;
    Ok(BaseImage::decode(&bytes, cli.scale)?)
}

fn default_output(input: &Path, encoding: ImageEncoding) -> PathBuf {
    input.with_file_name(export::default_file_name(encoding))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => EditorConfig::load_from(path)?,
        None => EditorConfig::load(),
    };
    if let Some(block) = cli.block {
        config.blur_block_size = block;
    }
    if let Some(quality) = cli.quality {
        config.jpeg_quality = quality;
    }
    if cli.downsample {
        config.display.downsample_on_export = true;
    }
    if cli.actual_size {
        config.display.fit_to_window = false;
    }

    let base = load_base(&cli)?;
    let mut session = EditorSession::new(base).with_font(config.load_font());
    let viewport = match cli.view {
        Some(At(view)) => Viewport::fitted(session.canvas_size(), Size::new(view.x, view.y), &config.display),
        None => Viewport::identity(session.canvas_size()),
    };
    let ctx = ToolContext::from_config(&config);
    place_annotations(&mut session, &cli, &ctx, &viewport);
    log::info!("Placed {} annotations", session.objects().len());

    let output = cli
        .output
        .clone()
        .unwrap_or_else(|| default_output(&cli.input, config.encoding));

    if is_stdio(&output) {
        let (_, bytes) = export::export_in_background(
            session.snapshot(),
            session.font().cloned(),
            ImageEncoding::Png,
            config.jpeg_quality,
            config.display,
        )
        .await?;
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(&bytes).context("writing image to stdout")?;
        stdout.flush().context("flushing stdout")?;
        return Ok(());
    }

    let encoding = ImageEncoding::from_path(&output);
    let flattened = export::flatten_in_background(session.snapshot(), session.font().cloned())
        .await
        .context("flattening annotations")?;
    let image = export::prepare_for_export(&flattened, session.base(), &config.display);

    let mut sink = FileSink::new(&output);
    sink.write(&image, encoding, config.jpeg_quality)?;
    sink.verify()?;
    println!("{}", output.display());
    Ok(())
}
