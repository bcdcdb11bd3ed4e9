use clap::Parser;

use crate::config::defs::{DEFAULT_MIN_QUALITY, DEFAULT_PLOTS, DEFAULT_SCRIPT_DIR, DEFAULT_TRUNC_LEFT, DEFAULT_TRUNC_LEN, DEFAULT_VERSIONS_FILE};

#[derive(Parser, Debug, Clone, Default)]
#[command(name = "dada2-dispatch", version, about = "Configures and dispatches DADA2 pipeline stages")]
pub struct Arguments {

    #[arg(short, long, help = "Stage to run: versions, select, filter, denoise, taxonomy, phylotree, tracker")]
    pub module: String,

    #[arg(short = 'v', long = "verbose", action)]
    pub verbose: bool,

    #[arg(long, default_value = DEFAULT_VERSIONS_FILE, help = "Tab separated list of DADA2 installations. Created from the installed R package if missing.")]
    pub versions_file: String,

    #[arg(long, help = "DADA2 version by label ('1.10.0 (stable)') or id ('1.10.0'); defaults to the latest stable")]
    pub dada2_version: Option<String>,

    #[arg(long, default_value = DEFAULT_SCRIPT_DIR)]
    pub script_dir: String,

    #[arg(long, default_value_t = false, help = "Print the command instead of running it")]
    pub dry_run: bool,

    #[arg(short = 'o', long = "out", help = "Output directory of the stage")]
    pub out_dir: Option<String>,

    #[arg(short = 'p', long, default_value_t = DEFAULT_PLOTS, help = "Number of quality or error plots")]
    pub plots: u32,

    // Sample selection
    #[arg(long, help = "Directory holding the pair1/pair2 read files")]
    pub input_dir: Option<String>,

    #[clap(long, value_delimiter = ',', help = "Comma-separated sample names to select (e.g., S1,S2)")]
    pub samples: Vec<String>,

    #[arg(long, default_value_t = false)]
    pub all_samples: bool,

    #[arg(long, default_value_t = false, help = "Pair read files by sample name instead of sorted position")]
    pub pair_by_name: bool,

    // Filtering
    #[arg(short = 'f', long)]
    pub forward: Option<String>,

    #[arg(short = 'r', long)]
    pub reverse: Option<String>,

    #[arg(long, default_value_t = false, help = "Confirm filtering without reverse reads")]
    pub single_end: bool,

    #[arg(long, default_value_t = DEFAULT_TRUNC_LEFT)]
    pub trunc_left_fwd: u32,

    #[arg(long)]
    pub trunc_left_rev: Option<u32>,

    #[arg(long, default_value_t = DEFAULT_TRUNC_LEN)]
    pub trunc_len_fwd: u32,

    #[arg(long)]
    pub trunc_len_rev: Option<u32>,

    #[arg(long)]
    pub min_len_fwd: Option<u32>,

    #[arg(long)]
    pub min_len_rev: Option<u32>,

    #[arg(long)]
    pub max_len_fwd: Option<u32>,

    #[arg(long)]
    pub max_len_rev: Option<u32>,

    #[arg(short = 'e', long)]
    pub max_ee: Option<u32>,

    #[arg(short = 'q', long = "min_quality", default_value_t = DEFAULT_MIN_QUALITY)]
    pub min_quality: u32,

    #[arg(long, default_value_t = false)]
    pub no_compress: bool,

    #[arg(long, default_value_t = false, help = "Silence the filtering script")]
    pub quiet_filter: bool,

    // Denoising
    #[arg(long)]
    pub filtered_dir: Option<String>,

    #[arg(long, help = "Pooling mode for sample inference; needs DADA2 >= 1.8.0")]
    pub pool: Option<u32>,

    #[arg(long, default_value_t = false)]
    pub override_seqtab: bool,

    #[arg(long, default_value_t = false)]
    pub override_chimera: bool,

    #[arg(long, default_value_t = false)]
    pub concat: bool,

    // Taxonomy and phylogenetic tree
    #[arg(short = 'i', long)]
    pub input: Option<String>,

    #[arg(short = 'd', long, help = "Reference database: silva, rdp, gg or unite")]
    pub database: Option<String>,

    #[arg(long, default_value_t = false)]
    pub biom: bool,

    #[arg(long, default_value_t = false)]
    pub tree: bool,

    #[arg(long, default_value_t = false)]
    pub no_phyloseq: bool,

    // Sequence tracker
    #[arg(long)]
    pub filtering_rdata: Option<String>,

    #[arg(long)]
    pub dada_rdata: Option<String>,

    #[arg(long)]
    pub merged_rdata: Option<String>,

    #[arg(long)]
    pub seqtab_raw_rdata: Option<String>,

    #[arg(long)]
    pub seqtab_clean_rdata: Option<String>,
}
