/*!
mapstyle Command Line Interface

Translates layer styles, recolors symbols and converts between style encodings.

## Usage

```bash
mapstyle translate layer.json --default
mapstyle classify '{"color": "#3075e9", "fillColor": "#f2f2f2"}'
mapstyle recolor styles.json --root ./symbols --config colorizer.json
mapstyle convert style.json --from mapstore --to geostyler
```

Set `RUST_LOG` to control logging (default `mapstyle=info`).
*/

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, bail, Context};
use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mapstyle::geostyler::{apply_default_style_to_layer, geostyler_style_filter, translate_layer};
use mapstyle::parser::ParserRegistry;
use mapstyle::style::{classify, hash_and_stringify, styler_title};
use mapstyle::symbol::{draw_icons, ColorizerOptions, FileFetcher, SvgColorizer, SymbolCache};
use mapstyle::{Feature, FilterExpression, FlatStyle, Layer, StructuredStyle, VERSION};

#[derive(Parser)]
#[command(name = "mapstyle")]
#[command(about = "Map layer style translation and symbol recoloring")]
#[command(version = VERSION)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Translate a layer's style into a GeoStyler style
    Translate {
        /// Layer JSON file ("-" for stdin)
        input: PathBuf,

        /// Apply the default style to layers without one
        #[arg(long)]
        default: bool,

        /// Output file path
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Show the kinds and title of a flat style
    Classify {
        /// Flat style as JSON
        style: String,
    },

    /// Print the content hash of a flat style
    Hash {
        /// Flat style as JSON
        style: String,
    },

    /// Evaluate a filter against feature properties
    Filter {
        /// Filter expression as JSON, e.g. '["==", "id", 1]'
        filter: String,

        /// Feature properties as JSON
        #[arg(long, default_value = "{}")]
        properties: String,
    },

    /// Recolor the SVG symbols of a list of flat styles
    Recolor {
        /// JSON file with a flat style or an array of them ("-" for stdin)
        input: PathBuf,

        /// Directory relative symbol URLs resolve against
        #[arg(long, default_value = ".")]
        root: PathBuf,

        /// Colorizer options JSON file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output file path
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Convert a style between encodings
    Convert {
        /// Encoded style file ("-" for stdin)
        input: PathBuf,

        /// Source format (geostyler, mapstore)
        #[arg(long, default_value = "mapstore")]
        from: String,

        /// Target format (geostyler, mapstore)
        #[arg(long, default_value = "geostyler")]
        to: String,

        /// Output file path
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Render the point symbolizers of a GeoStyler style as images
    Icons {
        /// GeoStyler style JSON file ("-" for stdin)
        input: PathBuf,

        /// Directory relative image URLs resolve against
        #[arg(long, default_value = ".")]
        root: PathBuf,

        /// Output file path
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn read_input(path: &Path) -> anyhow::Result<String> {
    if path.as_os_str() == "-" {
        let mut content = String::new();
        std::io::stdin()
            .read_to_string(&mut content)
            .context("Failed to read stdin")?;
        return Ok(content);
    }
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn write_output(output: Option<&Path>, content: &str) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Output written to {}", path.display());
        }
        None => println!("{}", content),
    }
    Ok(())
}

fn parse_flat_style(json: &str) -> anyhow::Result<FlatStyle> {
    match serde_json::from_str::<Value>(json).context("Invalid style JSON")? {
        Value::Object(style) => Ok(style),
        other => bail!("Expected a flat style object, got {}", other),
    }
}

fn parse_flat_styles(json: &str) -> anyhow::Result<Vec<FlatStyle>> {
    match serde_json::from_str::<Value>(json).context("Invalid style JSON")? {
        Value::Object(style) => Ok(vec![style]),
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::Object(style) => Ok(style),
                other => Err(anyhow!("Expected a flat style object, got {}", other)),
            })
            .collect(),
        other => bail!("Expected a flat style or an array of them, got {}", other),
    }
}

fn load_options(config: Option<&Path>) -> anyhow::Result<ColorizerOptions> {
    match config {
        Some(path) => Ok(ColorizerOptions::from_json_file(path)?),
        None => Ok(ColorizerOptions::default()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mapstyle=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Translate {
            input,
            default,
            output,
        } => {
            let layer: Layer =
                serde_json::from_str(&read_input(&input)?).context("Invalid layer JSON")?;
            let layer = if default {
                apply_default_style_to_layer(layer)
            } else {
                layer
            };
            let style = translate_layer(&layer);
            info!("Translated layer into {} rule(s)", style.body.rules.len());
            write_output(output.as_deref(), &serde_json::to_string_pretty(&style)?)?;
        }

        Commands::Classify { style } => {
            let style = parse_flat_style(&style)?;
            let kinds: Vec<String> = classify(&style).iter().map(|k| k.to_string()).collect();
            println!("kinds: {}", kinds.join(", "));
            println!("title: {}", styler_title(&style));
        }

        Commands::Hash { style } => {
            let style = parse_flat_style(&style)?;
            println!("{}", hash_and_stringify(Some(&style))?);
        }

        Commands::Filter { filter, properties } => {
            let filter: FilterExpression =
                serde_json::from_str(&filter).context("Invalid filter expression")?;
            let properties = match serde_json::from_str::<Value>(&properties)
                .context("Invalid properties JSON")?
            {
                Value::Object(properties) => properties,
                other => bail!("Expected properties object, got {}", other),
            };
            let feature = Feature::with_properties(properties);
            println!("{}", geostyler_style_filter(&feature, &filter));
        }

        Commands::Recolor {
            input,
            root,
            config,
            output,
        } => {
            let styles = parse_flat_styles(&read_input(&input)?)?;
            let options = load_options(config.as_deref())?;
            let colorizer = SvgColorizer::with_options(
                Arc::new(FileFetcher::new(root)),
                Arc::new(SymbolCache::new()),
                options,
            );
            let recolored = colorizer.recolor_batch(styles).await;
            info!(
                "Recolored {} style(s), {} symbol(s) cached",
                recolored.len(),
                colorizer.cache().len()
            );
            write_output(output.as_deref(), &serde_json::to_string_pretty(&recolored)?)?;
        }

        Commands::Convert {
            input,
            from,
            to,
            output,
        } => {
            let registry = ParserRegistry::with_builtin();
            let unknown = |name: &str| {
                anyhow!(
                    "Unknown format '{}' (available: {})",
                    name,
                    registry.names().join(", ")
                )
            };
            let reader = registry.resolve(&from).await?.ok_or_else(|| unknown(&from))?;
            let writer = registry.resolve(&to).await?.ok_or_else(|| unknown(&to))?;
            let style = reader.read_style(&read_input(&input)?).await?;
            write_output(output.as_deref(), &writer.write_style(&style).await?)?;
        }

        Commands::Icons {
            input,
            root,
            output,
        } => {
            let style: StructuredStyle =
                serde_json::from_str(&read_input(&input)?).context("Invalid GeoStyler style")?;
            let images = draw_icons(&style, &FileFetcher::new(root)).await;
            info!("Drew {} icon(s)", images.len());
            write_output(output.as_deref(), &serde_json::to_string_pretty(&images)?)?;
        }
    }

    Ok(())
}
