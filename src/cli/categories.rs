//! Categories command: list the catalog

use clap::Args;

use super::{print_json, Cli, CliError, OutputFormat};

/// Categories command arguments
#[derive(Debug, Args)]
pub struct CategoriesArgs {
    /// Only list categories whose name or identifier contains this text
    /// (case-insensitive)
    pub filter: Option<String>,
}

impl CategoriesArgs {
    /// Execute the categories command
    pub async fn execute(&self, cli: &Cli) -> Result<(), CliError> {
        let catalog = cli.load_catalog()?;
        let needle = self.filter.as_deref().map(str::to_lowercase);

        let categories: Vec<_> = catalog
            .categories()
            .iter()
            .filter(|category| match &needle {
                Some(needle) => {
                    category.name.to_lowercase().contains(needle)
                        || category.identifier.to_lowercase().contains(needle)
                }
                None => true,
            })
            .collect();

        match cli.output_format {
            OutputFormat::Json => print_json(&categories)?,
            OutputFormat::Human => {
                for category in &categories {
                    println!("{:<32} {}", category.identifier, category.name);
                }
                println!("\n{} of {} categories", categories.len(), catalog.len());
            }
        }

        Ok(())
    }
}
