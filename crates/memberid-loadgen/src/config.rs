use anyhow::bail;
use clap::Parser;
use memberid::{AllocatorConfig, Block, CAPACITY, MAX_BLOCK};

/// Runtime configuration for the `memberid-loadgen` binary.
///
/// Every value can be given as a CLI flag or an environment variable (a
/// `.env` file in the working directory is loaded first).
#[derive(Parser, Debug, Clone)]
#[command(
    name = "memberid-loadgen",
    version,
    about = "Drives concurrent registrations through the membership ID allocator"
)]
pub struct CliArgs {
    /// Number of users to register.
    ///
    /// Environment variable: `REGISTRATIONS`
    #[arg(long, env = "REGISTRATIONS", default_value_t = 10_000)]
    pub registrations: u64,

    /// Number of worker tasks performing registrations concurrently.
    ///
    /// Environment variable: `NUM_WORKERS`
    #[arg(long, env = "NUM_WORKERS", default_value_t = num_cpus::get())]
    pub num_workers: usize,

    /// Random candidates tried per block before moving on.
    ///
    /// Environment variable: `MAX_ATTEMPTS`
    #[arg(long, env = "MAX_ATTEMPTS", default_value_t = memberid::DEFAULT_MAX_ATTEMPTS)]
    pub max_attempts: u32,

    /// Blocks searched in each direction when the primary block is full.
    ///
    /// Environment variable: `MAX_FALLBACK_BLOCKS`
    #[arg(long, env = "MAX_FALLBACK_BLOCKS", default_value_t = memberid::DEFAULT_MAX_FALLBACK_BLOCKS)]
    pub max_fallback_blocks: u32,

    /// Times a registration searches again after losing the insert race.
    ///
    /// Environment variable: `MAX_ASSIGN_CONFLICTS`
    #[arg(long, env = "MAX_ASSIGN_CONFLICTS", default_value_t = memberid::DEFAULT_MAX_ASSIGN_CONFLICTS)]
    pub max_assign_conflicts: u32,

    /// Ordinals already issued before the run. The first registration gets
    /// `START_ORDINAL + 1`.
    ///
    /// Environment variable: `START_ORDINAL`
    #[arg(long, env = "START_ORDINAL", default_value_t = 0)]
    pub start_ordinal: u64,

    /// Block indices to fill completely before the run, comma separated.
    /// Useful to force the fallback search.
    ///
    /// Example: `PREFILL_BLOCKS=0,1,2`
    ///
    /// Environment variable: `PREFILL_BLOCKS`
    #[arg(long, env = "PREFILL_BLOCKS", value_delimiter = ',')]
    pub prefill_blocks: Vec<u64>,

    /// Capacity of each worker's request channel.
    ///
    /// Environment variable: `QUEUE_DEPTH`
    #[arg(long, env = "QUEUE_DEPTH", default_value_t = 256)]
    pub queue_depth: usize,

    /// Seconds to wait for each worker to acknowledge shutdown.
    ///
    /// Environment variable: `SHUTDOWN_TIMEOUT`
    #[arg(long, env = "SHUTDOWN_TIMEOUT", default_value_t = 3)]
    pub shutdown_timeout: u64,
}

#[derive(Debug, Clone)]
pub struct LoadConfig {
    pub registrations: u64,
    pub num_workers: usize,
    pub allocator: AllocatorConfig,
    pub start_ordinal: u64,
    pub prefill_blocks: Vec<Block>,
    pub queue_depth: usize,
    pub shutdown_timeout: u64,
}

impl TryFrom<CliArgs> for LoadConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        if args.num_workers == 0 {
            bail!("NUM_WORKERS must be greater than 0");
        }

        if args.registrations == 0 {
            bail!("REGISTRATIONS must be greater than 0");
        }

        if args.queue_depth == 0 {
            bail!("QUEUE_DEPTH must be greater than 0");
        }

        if args.start_ordinal >= u64::from(CAPACITY) {
            bail!(
                "START_ORDINAL ({}) leaves no room in the ID space (capacity = {})",
                args.start_ordinal,
                CAPACITY
            );
        }

        let prefill_blocks = args
            .prefill_blocks
            .iter()
            .map(|&index| match Block::new(index) {
                Some(block) => Ok(block),
                None => bail!("PREFILL_BLOCKS entry {index} exceeds the last block ({MAX_BLOCK})"),
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        let allocator = AllocatorConfig::default()
            .with_max_attempts(args.max_attempts)
            .with_max_fallback_blocks(args.max_fallback_blocks)
            .with_max_assign_conflicts(args.max_assign_conflicts);
        allocator.validate()?;

        Ok(Self {
            registrations: args.registrations,
            num_workers: args.num_workers,
            allocator,
            start_ordinal: args.start_ordinal,
            prefill_blocks,
            queue_depth: args.queue_depth,
            shutdown_timeout: args.shutdown_timeout,
        })
    }
}
