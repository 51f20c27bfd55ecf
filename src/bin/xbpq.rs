//! xbpq 命令行工具
//!
//! ```bash
//! # 对本地源码执行单条规则
//! xbpq run --file page.html '<li>&&</li>[去重]'
//!
//! # 从标准输入读取源码，JSON 输出
//! curl -s https://site.test/ | xbpq run '搜索模式:2#//a/@href' --json
//!
//! # 按字段依赖构建规则链并执行
//! xbpq field --fields fields.json --rules rules.json --file page.html 链接
//!
//! # 只查看字段的依赖上下文
//! xbpq field --fields fields.json --rules rules.json --file page.html 链接 --context
//! ```
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use xbpq::{ConfigManager, Engine, ExecutionResult, FieldRegistry, RuleSet};

#[derive(Parser)]
#[command(name = "xbpq", version, about = "XBPQ 规则解释器：对网页源码执行截取规则")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// 嵌套截取最大深度
    #[arg(long, global = true)]
    max_depth: Option<usize>,
}

#[derive(Subcommand)]
enum Commands {
    /// 对源码执行单条规则
    Run {
        #[command(flatten)]
        input: SourceInput,

        /// 规则文本
        rule: String,

        #[arg(long)]
        json: bool,
    },

    /// 按字段依赖链执行规则
    Field {
        #[command(flatten)]
        input: SourceInput,

        /// 字段元数据 JSON 文件
        #[arg(long)]
        fields: PathBuf,

        /// 规则集 JSON 文件
        #[arg(long)]
        rules: PathBuf,

        /// 目标字段ID
        field_id: String,

        /// 只输出依赖上下文
        #[arg(long)]
        context: bool,

        #[arg(long)]
        json: bool,
    },
}

#[derive(Args)]
struct SourceInput {
    /// 源码文件（缺省读取标准输入）
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// 远程源码地址
    #[cfg(feature = "http")]
    #[arg(short, long, conflicts_with = "file")]
    url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("xbpq=warn")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let mut builder = ConfigManager::custom();
    if let Some(depth) = cli.max_depth {
        builder = builder.max_nested_depth(depth);
    }
    let engine = Engine::new(builder.build());

    match cli.command {
        Commands::Run { input, rule, json } => {
            let source = read_source(&input, &engine).await?;
            let result = engine.run_rule(&source, &rule);
            print_result(&result, json)?;
        }
        Commands::Field {
            input,
            fields,
            rules,
            field_id,
            context,
            json,
        } => {
            let registry = FieldRegistry::from_json_str(&read_file(&fields)?)?;
            let rules = RuleSet::from_json_str(&read_file(&rules)?)?;
            let source = read_source(&input, &engine).await?;

            if context {
                let resolved = engine.resolve_context(&field_id, &source, &registry, &rules)?;
                if json {
                    println!("{}", serde_json::to_string_pretty(&resolved)?);
                } else {
                    println!("# 上下文来源: {}", resolved.parent_rule_id);
                    println!("{}", resolved.context);
                }
            } else {
                let chain = registry.build_chain(&field_id, &rules)?;
                let result = engine.run(&source, &chain);
                print_result(&result, json)?;
            }
        }
    }

    Ok(())
}

fn read_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("读取文件失败: {}", path.display()))
}

async fn read_source(input: &SourceInput, engine: &Engine) -> Result<String> {
    #[cfg(feature = "http")]
    if let Some(url) = &input.url {
        use xbpq::source::{HttpSourceProvider, SourceProvider, SourceRequest};
        let provider = HttpSourceProvider::new(engine.config())?;
        return Ok(provider.fetch(&SourceRequest::get(url.as_str())).await?);
    }
    #[cfg(not(feature = "http"))]
    let _ = engine;

    match &input.file {
        Some(path) => read_file(path),
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf).context("读取标准输入失败")?;
            Ok(buf)
        }
    }
}

fn print_result(result: &ExecutionResult, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
        return Ok(());
    }
    match &result.error {
        Some(error) => eprintln!("{}", error),
        None => result.data.iter().for_each(|item| println!("{}", item)),
    }
    Ok(())
}
