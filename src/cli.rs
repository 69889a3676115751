// src/cli.rs
//! Offline commands: score a CV file, render it, browse locations and
//! export the application tracker.
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::app_log;
use crate::ats::{self, AtsPolicy};
use crate::core::{ConfigManager, Database, FsOps, TemplateEngine};
use crate::export::{render_typst, PaperSize, PdfExporter};
use crate::jobs::locations;
use crate::records::ApplicationRepository;
use crate::types::cv_data::CvDocument;

#[derive(Parser)]
#[command(name = "careerkit-cli")]
#[command(about = "Score, render and track CVs from the command line")]
pub struct CareerCli {
    #[command(subcommand)]
    pub command: CareerCommand,

    /// Config file, defaults to ./config.yaml
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum CareerCommand {
    /// Score a CV file (JSON or YAML) with the local heuristics
    Analyze {
        cv: PathBuf,
        /// Plain-text job description to match keywords against
        #[arg(long)]
        job: Option<PathBuf>,
        /// Print the full result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Render a CV file to Typst source, or to PDF with --pdf
    Render {
        cv: PathBuf,
        #[arg(long, default_value = "default")]
        template: String,
        #[arg(long, default_value = "en")]
        language: String,
        #[arg(long, default_value = "a4", value_parser = ["a4", "letter"])]
        paper: String,
        #[arg(long)]
        pdf: bool,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List supported countries, or the cities of one country
    Cities { country: Option<String> },
    /// List the available templates
    Templates,
    /// Write a user's application tracker as CSV
    ExportApplications {
        user_id: String,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn load_config(path: Option<&Path>) -> Result<ConfigManager> {
    match path {
        Some(path) => {
            let environment = std::env::var("CAREERKIT_ENV").unwrap_or_else(|_| "local".to_string());
            ConfigManager::load_from(path, &environment)
        }
        None => ConfigManager::load(),
    }
}

pub async fn read_cv_file(path: &Path) -> Result<CvDocument> {
    let content = FsOps::read_file_safe(path).await?;
    let is_yaml = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"));

    if is_yaml {
        serde_yaml::from_str(&content)
            .with_context(|| format!("Invalid CV YAML in {}", path.display()))
    } else {
        serde_json::from_str(&content)
            .with_context(|| format!("Invalid CV JSON in {}", path.display()))
    }
}

fn paper_size(name: &str) -> PaperSize {
    match name {
        "letter" => PaperSize::Letter,
        _ => PaperSize::A4,
    }
}

fn print_report(result: &ats::AnalysisResult) {
    let b = &result.breakdown;
    println!("ATS score: {}/100", result.score);
    println!(
        "  structure {:>3}  keywords {:>3}  action verbs {:>3}  metrics {:>3}  formatting {:>3}",
        b.structure, b.keywords, b.action_verbs, b.metrics, b.formatting
    );
    if !result.matched_keywords.is_empty() {
        println!("Matched: {}", result.matched_keywords.join(", "));
    }
    if !result.missing_keywords.is_empty() {
        println!("Missing: {}", result.missing_keywords.join(", "));
    }
    for strength in &result.strengths {
        println!("+ {}", strength);
    }
    for suggestion in &result.suggestions {
        println!("- {}", suggestion);
    }
}

pub async fn handle_command(cli: CareerCli) -> Result<()> {
    match cli.command {
        CareerCommand::Analyze { cv, job, json } => {
            let policy = match load_config(cli.config.as_deref()) {
                Ok(config) => config.ats_policy,
                Err(e) => {
                    app_log!(warn, "Using default scoring policy: {:#}", e);
                    AtsPolicy::default()
                }
            };
            let document = read_cv_file(&cv).await?;
            let job_description = match job {
                Some(path) => Some(FsOps::read_file_safe(&path).await?),
                None => None,
            };

            let result = ats::analyze_local(&document, job_description.as_deref(), &policy);
            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print_report(&result);
            }
        }

        CareerCommand::Render {
            cv,
            template,
            language,
            paper,
            pdf,
            output,
        } => {
            let config = load_config(cli.config.as_deref())?;
            let engine = TemplateEngine::new(config.environment.templates_path.clone())?;
            let document = read_cv_file(&cv).await?;
            let paper = paper_size(&paper);

            if pdf {
                let exporter = PdfExporter::new(Arc::new(engine));
                let exported = exporter
                    .export(&document, &template, &language, paper)
                    .await?;
                let target = output.unwrap_or_else(|| PathBuf::from(&exported.filename));
                tokio::fs::write(&target, &exported.bytes)
                    .await
                    .with_context(|| format!("Failed to write {}", target.display()))?;
                println!("Wrote {}", target.display());
            } else {
                let style = &engine.resolve(&template).manifest;
                let source = render_typst(&document, style, paper, &language);
                match output {
                    Some(target) => {
                        FsOps::write_file_safe(&target, &source).await?;
                        println!("Wrote {}", target.display());
                    }
                    None => print!("{}", source),
                }
            }
        }

        CareerCommand::Cities { country } => match country {
            Some(country) => match locations::resolve_country(&country) {
                Some(found) => {
                    println!("{} ({})", found.name, found.code);
                    for city in found.cities {
                        println!("  {}", city);
                    }
                }
                None => anyhow::bail!("Unknown country: {}", country),
            },
            None => {
                for country in locations::COUNTRIES {
                    println!("{:<4} {}", country.code, country.name);
                }
            }
        },

        CareerCommand::Templates => {
            let config = load_config(cli.config.as_deref())?;
            let engine = TemplateEngine::new(config.environment.templates_path.clone())?;
            for template in engine.list_templates() {
                match template.manifest.description.as_deref() {
                    Some(description) => println!(
                        "{:<16} {} ({})",
                        template.id, template.manifest.name, description
                    ),
                    None => println!("{:<16} {}", template.id, template.manifest.name),
                }
            }
        }

        CareerCommand::ExportApplications { user_id, output } => {
            let config = load_config(cli.config.as_deref())?;
            let db = Database::new(&config.environment.database_path).await?;
            let content = ApplicationRepository::new(db.pool())
                .export_csv(&user_id)
                .await?;
            match output {
                Some(target) => {
                    FsOps::write_file_safe(&target, &content).await?;
                    println!("Wrote {}", target.display());
                }
                None => print!("{}", content),
            }
        }
    }

    Ok(())
}
