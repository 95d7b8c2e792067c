// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command-line surface: argument definitions and how flags override the
// loaded configuration.

use std::io::Read;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};
use codepress_core::color::parse_hex;
use codepress_core::error::{CodepressError, Result};
use codepress_core::{
    AppConfig, Arrangement, BarcodeOptions, Delimiter, ExportFormat, PageSize, QrOptions,
    RenderOptions, Symbology, TextPosition, split_items,
};

#[derive(Debug, Parser)]
#[command(name = "codepress", version, about = "Batch QR code and barcode sheets")]
pub struct Cli {
    /// JSON configuration file. Missing file means defaults.
    #[arg(long, global = true, default_value = "codepress.json")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Render every item and report progress; optionally save the first few.
    Generate {
        #[command(flatten)]
        input: InputArgs,
        #[command(flatten)]
        render: RenderArgs,
        /// Save the displayed codes as PNG files in this directory.
        #[arg(long)]
        save_dir: Option<PathBuf>,
    },
    /// Compose pages and write PDF segments or PNG/JPG files.
    Export {
        #[command(flatten)]
        input: InputArgs,
        #[command(flatten)]
        render: RenderArgs,
        #[command(flatten)]
        layout: LayoutArgs,
        #[arg(long, value_enum, default_value_t = FormatArg::Pdf)]
        format: FormatArg,
        /// PDF: document path (segments are numbered beside it).
        /// PNG/JPG: output directory.
        #[arg(long, short)]
        output: PathBuf,
        /// PNG/JPG: write one file per item when the batch overflows a page.
        #[arg(long)]
        split: bool,
    },
    /// Compose the first page and save it scaled to a viewport.
    Preview {
        #[command(flatten)]
        input: InputArgs,
        #[command(flatten)]
        render: RenderArgs,
        #[command(flatten)]
        layout: LayoutArgs,
        #[arg(long, short)]
        output: PathBuf,
        #[arg(long, default_value_t = 800)]
        width: u32,
        #[arg(long, default_value_t = 1100)]
        height: u32,
    },
}

#[derive(Debug, Args)]
pub struct InputArgs {
    /// Item list; `-` reads standard input.
    #[arg(long, short, default_value = "-")]
    pub input: PathBuf,
    #[arg(long, value_enum, default_value_t = DelimiterArg::Auto)]
    pub delimiter: DelimiterArg,
}

#[derive(Debug, Args)]
pub struct RenderArgs {
    #[arg(long, value_enum)]
    pub mode: Option<ModeArg>,
    /// Barcode symbology, e.g. code128, ean13, upca.
    #[arg(long)]
    pub symbology: Option<String>,
    /// QR output width in pixels.
    #[arg(long)]
    pub out_px: Option<u32>,
    /// Barcode narrow bar width in pixels.
    #[arg(long)]
    pub bar_width: Option<u32>,
    /// Draw the payload text next to each code.
    #[arg(long)]
    pub show_text: bool,
    #[arg(long, value_enum)]
    pub text_position: Option<PositionArg>,
    #[arg(long)]
    pub text_size: Option<u32>,
    /// Foreground colour as hex, e.g. "#000" or "1a2b3c".
    #[arg(long)]
    pub fg: Option<String>,
    /// Background colour as hex.
    #[arg(long)]
    pub bg: Option<String>,
    /// TrueType/OpenType font for labels and captions.
    #[arg(long)]
    pub font: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct LayoutArgs {
    #[arg(long, value_enum)]
    pub page_size: Option<PageSizeArg>,
    #[arg(long, value_enum)]
    pub arrangement: Option<ArrangementArg>,
    #[arg(long)]
    pub columns: Option<u32>,
    /// Keep the configured code size instead of fitting the column count.
    #[arg(long)]
    pub no_auto_size: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum DelimiterArg {
    Auto,
    Comma,
    Semicolon,
    Newline,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ModeArg {
    Qr,
    Barcode,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum PositionArg {
    Top,
    Bottom,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum FormatArg {
    Pdf,
    Png,
    Jpg,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum PageSizeArg {
    A3,
    A4,
    A5,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ArrangementArg {
    Horizontal,
    Vertical,
}

// -- Conversions --------------------------------------------------------------

impl From<DelimiterArg> for Delimiter {
    fn from(arg: DelimiterArg) -> Self {
        match arg {
            DelimiterArg::Auto => Self::Auto,
            DelimiterArg::Comma => Self::Comma,
            DelimiterArg::Semicolon => Self::Semicolon,
            DelimiterArg::Newline => Self::Newline,
        }
    }
}

impl From<FormatArg> for ExportFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Pdf => Self::Pdf,
            FormatArg::Png => Self::Png,
            FormatArg::Jpg => Self::Jpg,
        }
    }
}

impl From<PageSizeArg> for PageSize {
    fn from(arg: PageSizeArg) -> Self {
        match arg {
            PageSizeArg::A3 => Self::A3,
            PageSizeArg::A4 => Self::A4,
            PageSizeArg::A5 => Self::A5,
        }
    }
}

impl From<ArrangementArg> for Arrangement {
    fn from(arg: ArrangementArg) -> Self {
        match arg {
            ArrangementArg::Horizontal => Self::Horizontal,
            ArrangementArg::Vertical => Self::Vertical,
        }
    }
}

// -- Input ----------------------------------------------------------------------

impl InputArgs {
    /// Read and split the item list.
    pub fn read_items(&self) -> Result<Vec<String>> {
        let raw = if self.input == Path::new("-") {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .map_err(|e| CodepressError::file_io("read items", "<stdin>", e))?;
            buffer
        } else {
            std::fs::read_to_string(&self.input)
                .map_err(|e| CodepressError::file_io("read items", &self.input, e))?
        };
        Ok(split_items(&raw, self.delimiter.into()))
    }
}

// -- Overrides --------------------------------------------------------------------

impl RenderArgs {
    /// Apply flags on top of the configured renderer options and font.
    pub fn apply(&self, config: &mut AppConfig) -> Result<()> {
        match (self.mode, &config.render) {
            (Some(ModeArg::Qr), RenderOptions::Barcode(_)) => {
                config.render = RenderOptions::Qr(QrOptions::default());
            }
            (Some(ModeArg::Barcode), RenderOptions::Qr(_)) => {
                config.render = RenderOptions::Barcode(BarcodeOptions::default());
            }
            _ => {}
        }

        match &mut config.render {
            RenderOptions::Qr(o) => {
                if let Some(px) = self.out_px {
                    o.out_px = px;
                }
                if let Some(fg) = &self.fg {
                    o.module_color = parse_hex(fg);
                }
                if let Some(bg) = &self.bg {
                    o.back_color = parse_hex(bg);
                }
            }
            RenderOptions::Barcode(o) => {
                if let Some(name) = &self.symbology {
                    o.symbology = Symbology::from_name(name).ok_or_else(|| {
                        CodepressError::InvalidOptions(format!("unknown symbology {name:?}"))
                    })?;
                }
                if let Some(px) = self.bar_width {
                    o.narrow_bar_px = px;
                }
                if let Some(fg) = &self.fg {
                    o.bar_color = parse_hex(fg);
                }
                if let Some(bg) = &self.bg {
                    o.bg_color = parse_hex(bg);
                }
            }
        }

        let text = match &mut config.render {
            RenderOptions::Qr(o) => &mut o.text,
            RenderOptions::Barcode(o) => &mut o.text,
        };
        if self.show_text {
            text.show = true;
        }
        if let Some(position) = self.text_position {
            text.position = match position {
                PositionArg::Top => TextPosition::Top,
                PositionArg::Bottom => TextPosition::Bottom,
            };
        }
        if let Some(size) = self.text_size {
            text.size_px = size;
        }

        if let Some(font) = &self.font {
            config.font.path = Some(font.clone());
        }
        Ok(())
    }
}

impl LayoutArgs {
    pub fn apply(&self, config: &mut AppConfig) {
        let layout = &mut config.layout;
        if let Some(size) = self.page_size {
            layout.page_size = size.into();
        }
        if let Some(arrangement) = self.arrangement {
            layout.arrangement = arrangement.into();
        }
        if let Some(columns) = self.columns {
            layout.columns = columns;
        }
        if self.no_auto_size {
            layout.auto_size = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use codepress_core::ColorSpec;

    #[test]
    fn export_arguments_parse() {
        let cli = Cli::try_parse_from([
            "codepress", "export", "-i", "items.txt", "--format", "png", "-o", "out", "--split",
            "--mode", "barcode", "--symbology", "ean-13", "--columns", "4",
        ])
        .unwrap();
        let Command::Export {
            render, layout, format, split, ..
        } = cli.command
        else {
            panic!("wrong subcommand");
        };
        assert!(split);
        assert!(matches!(format, FormatArg::Png));

        let mut config = AppConfig::default();
        render.apply(&mut config).unwrap();
        layout.apply(&mut config);
        let RenderOptions::Barcode(o) = &config.render else {
            panic!("mode not switched");
        };
        assert_eq!(o.symbology, Symbology::Ean13);
        assert_eq!(config.layout.columns, 4);
    }

    #[test]
    fn colour_flags_override_config() {
        let cli = Cli::try_parse_from([
            "codepress", "generate", "--fg", "#f00", "--out-px", "120", "--show-text",
        ])
        .unwrap();
        let Command::Generate { render, .. } = cli.command else {
            panic!("wrong subcommand");
        };
        let mut config = AppConfig::default();
        render.apply(&mut config).unwrap();
        let RenderOptions::Qr(o) = &config.render else {
            panic!("mode changed");
        };
        assert_eq!(o.out_px, 120);
        assert_eq!(o.module_color, ColorSpec::rgb(255, 0, 0));
        assert!(o.text.show);
    }

    #[test]
    fn unknown_symbology_is_rejected() {
        let cli = Cli::try_parse_from([
            "codepress", "generate", "--mode", "barcode", "--symbology", "morse",
        ])
        .unwrap();
        let Command::Generate { render, .. } = cli.command else {
            panic!("wrong subcommand");
        };
        assert!(render.apply(&mut AppConfig::default()).is_err());
    }
}
