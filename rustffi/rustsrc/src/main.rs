use std::path::PathBuf;
use std::process::ExitCode;

use bib_marshal::config::{DEFAULT_ARRAY_LIB, DEFAULT_HELLO_LIB, DEFAULT_LIB_DIR};
use bib_marshal::{
    format_shape, library, pass_flat, process_2d, process_3d, say_hello, signature, ArrayBindings,
    HarnessConfig, HelloBinding, NumericArray, Result,
};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "bib", version, about = "Call the bib native libraries with sample arrays")]
struct Cli {
    /// Directory holding the native libraries
    #[arg(long, env = "BIB_LIB_DIR", default_value = DEFAULT_LIB_DIR)]
    lib_dir: PathBuf,

    /// Base name of the library exporting `test_func`
    #[arg(long, env = "BIB_HELLO_LIB", default_value = DEFAULT_HELLO_LIB)]
    hello_lib: String,

    /// Base name of the library exporting the array functions
    #[arg(long, env = "BIB_ARRAY_LIB", default_value = DEFAULT_ARRAY_LIB)]
    array_lib: String,

    /// Log filter, e.g. `info` or `bib_marshal=debug`
    #[arg(long, env = "BIB_LOG", default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Clone, Copy)]
enum Command {
    /// Call `test_func`
    Hello,
    /// Pass a 4x5 matrix to `test_arr_func` as a flat pointer
    Array,
    /// Pass a 2x3 matrix to `test_2darr_func` through row-pointer tables
    #[command(name = "array2d")]
    Array2d,
    /// Prepare a 3x3x3 call to `test_3darr_func` (not invoked)
    #[command(name = "array3d")]
    Array3d,
    /// List the declared native signatures
    Signatures,
}

impl Cli {
    fn config(&self) -> HarnessConfig {
        HarnessConfig {
            lib_dir: self.lib_dir.clone(),
            hello_lib: self.hello_lib.clone(),
            array_lib: self.array_lib.clone(),
        }
    }
}

fn init_logging(filter: &str) {
    let filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn format_addresses(addresses: &[usize]) -> String {
    let items: Vec<String> = addresses.iter().map(|a| a.to_string()).collect();
    format!("[{}]", items.join(" "))
}

fn run(command: Command, config: &HarnessConfig) -> Result<()> {
    match command {
        Command::Hello => {
            let binding = HelloBinding::load(config)?;
            say_hello(&binding);
        }
        Command::Array => {
            let bindings = ArrayBindings::load(config)?;
            let x = NumericArray::<f64>::range(&[4, 5])?;
            println!("{}", signature::FLAT_ARRAY);
            println!("{}", format_shape(x.shape()));
            pass_flat(&bindings, &x)?;
        }
        Command::Array2d => {
            let bindings = ArrayBindings::load(config)?;
            let x = NumericArray::<f64>::range(&[2, 3])?;
            let processed = process_2d(&bindings, &x)?;
            println!("{}", x);
            println!("out");
            println!("{}", processed.output);
            println!("{}", format_addresses(&processed.input_table));
        }
        Command::Array3d => {
            let bindings = ArrayBindings::load(config)?;
            let x = NumericArray::<f64>::range(&[3, 3, 3])?;
            let processed = process_3d(&bindings, &x)?;
            println!("{}", x);
            println!("out");
            println!("{}", processed.output);
            println!("{}", format_shape(&[processed.input_table.len()]));
        }
        Command::Signatures => {
            for sig in signature::ALL {
                println!("{:<10} {}", config.library_name(sig.library), sig);
            }
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let config = cli.config();
    let outcome = run(cli.command, &config);
    if let Err(err) = library::release_all() {
        tracing::warn!(%err, "could not release native libraries");
    }

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err);
            ExitCode::FAILURE
        }
    }
}
