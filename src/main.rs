use anyhow::Result;
use clap::{Parser, Subcommand};
use log::{debug, error};

use dbsquery::{DbsClient, FilterSpec, Instance, SortOrder, list_datasets, list_files};

#[derive(Debug, Parser)]
#[command(name = "dbsquery", version, about = "Get information from DBS")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Return a list of datasets.
    Dataset(DatasetArgs),
    /// Return a list of files.
    Files(FilesArgs),
}

#[derive(Debug, clap::Args)]
struct DatasetArgs {
    /// Full dataset names, form /[primaryDataset]/[processName]/[dataTier]
    #[arg(long, num_args = 0..)]
    datasets: Vec<String>,
    /// Primary dataset names
    #[arg(long = "primaryDatasets", num_args = 0..)]
    primary_datasets: Vec<String>,
    /// Acquisition era for datasets
    #[arg(long = "acquisitionEras", num_args = 0..)]
    acquisition_eras: Vec<String>,
    /// Process name patterns (shell-style globs)
    #[arg(long = "processNames", num_args = 0..)]
    process_names: Vec<String>,
    /// Data tiers for datasets
    #[arg(long = "dataTiers", num_args = 0..)]
    data_tiers: Vec<String>,
    /// Use non-default DBS instance
    #[arg(long, value_enum, default_value_t = Instance::Global)]
    instance: Instance,
    /// Define output sort order
    #[arg(long = "sortOrder", value_enum, default_value_t = SortOrder::Name)]
    sort_order: SortOrder,
}

#[derive(Debug, clap::Args)]
struct FilesArgs {
    /// Dataset names
    #[arg(long, num_args = 0..)]
    datasets: Vec<String>,
    /// Use non-default DBS instance
    #[arg(long, value_enum, default_value_t = Instance::Global)]
    instance: Instance,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match cli.command {
        Command::Dataset(args) => run_dataset(args),
        Command::Files(args) => run_files(args),
    }
}

fn run_dataset(args: DatasetArgs) -> Result<()> {
    let filters = FilterSpec {
        datasets: args.datasets,
        primary_datasets: args.primary_datasets,
        acquisition_eras: args.acquisition_eras,
        data_tiers: args.data_tiers,
        process_patterns: FilterSpec::compile_patterns(&args.process_names)?,
        sort_order: args.sort_order,
    };

    let client = match DbsClient::from_env(args.instance) {
        Ok(client) => client,
        Err(e) => {
            error!("{:#}", e);
            std::process::exit(1);
        }
    };
    debug!("querying DBS instance {}", args.instance);

    for dataset in list_datasets(&client, &filters)? {
        println!("{}", dataset);
    }
    Ok(())
}

fn run_files(args: FilesArgs) -> Result<()> {
    let client = match DbsClient::from_env(args.instance) {
        Ok(client) => client,
        Err(e) => {
            error!("{:#}", e);
            std::process::exit(1);
        }
    };
    debug!("querying DBS instance {}", args.instance);

    for file in list_files(&client, &args.datasets)? {
        println!("{}", file);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dataset_defaults_to_global_instance_and_name_order() {
        let cli = Cli::try_parse_from(["dbsquery", "dataset"]).unwrap();
        match cli.command {
            Command::Dataset(args) => {
                assert_eq!(args.instance, Instance::Global);
                assert_eq!(args.sort_order, SortOrder::Name);
                assert!(args.datasets.is_empty());
            }
            _ => panic!("expected dataset subcommand"),
        }
    }

    #[test]
    fn dataset_accepts_multiple_values_per_flag() {
        let cli = Cli::try_parse_from([
            "dbsquery",
            "dataset",
            "--primaryDatasets",
            "ZeroBias",
            "SingleMuon",
            "--dataTiers",
            "RAW",
            "--sortOrder",
            "time",
            "--instance",
            "phys03",
        ])
        .unwrap();
        match cli.command {
            Command::Dataset(args) => {
                assert_eq!(args.primary_datasets, ["ZeroBias", "SingleMuon"]);
                assert_eq!(args.data_tiers, ["RAW"]);
                assert_eq!(args.sort_order, SortOrder::Time);
                assert_eq!(args.instance, Instance::Phys03);
            }
            _ => panic!("expected dataset subcommand"),
        }
    }

    #[test]
    fn files_parses_datasets_and_instance() {
        let cli =
            Cli::try_parse_from(["dbsquery", "files", "--datasets", "/A/B/C", "/D/E/F"]).unwrap();
        match cli.command {
            Command::Files(args) => {
                assert_eq!(args.datasets, ["/A/B/C", "/D/E/F"]);
                assert_eq!(args.instance, Instance::Global);
            }
            _ => panic!("expected files subcommand"),
        }
    }

    #[test]
    fn rejects_unknown_instance() {
        assert!(Cli::try_parse_from(["dbsquery", "files", "--instance", "prod"]).is_err());
    }
}
