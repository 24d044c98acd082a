use bsonkit_cli::{init_logging, Cli};
use bsonkit_common::BsonkitConfig;
use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "bsonkit")]
#[command(author = "ITSTUDIO")]
#[command(version)]
#[command(about = "bsonkit - inspect BSON dump files")]
struct Args {
    /// TOML 配置文件
    #[arg(short, long, env = "BSONKIT_CONFIG")]
    config: Option<PathBuf>,

    /// 覆盖配置文件中的日志级别
    #[arg(long)]
    log_level: Option<String>,

    #[arg(long)]
    no_color: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 缩进打印文件中的每个文档
    Dump { file: PathBuf },

    /// 每个文档输出一个宽松扩展 JSON 值
    Json {
        file: PathBuf,

        #[arg(long)]
        pretty: bool,
    },

    /// 统计文档数、字节数与各元素类型的数量
    Stats { file: PathBuf },
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => BsonkitConfig::from_file(path)?,
        None => BsonkitConfig::default(),
    };

    let level = args.log_level.as_deref().unwrap_or(&config.log.level);
    init_logging(level);

    let cli = Cli::new(config, !args.no_color);
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match &args.command {
        Command::Dump { file } => cli.dump(file, &mut out)?,
        Command::Json { file, pretty } => cli.json(file, *pretty, &mut out)?,
        Command::Stats { file } => cli.stats(file, &mut out)?,
    }

    out.flush()?;
    Ok(())
}
