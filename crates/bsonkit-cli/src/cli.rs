use crate::formatter::Formatter;
use crate::stats::Stats;
use crate::{CliError, CliResult};
use bsonkit::{to_relaxed_json_with_depth, DocumentStream, Printer, RawDocument};
use bsonkit_common::BsonkitConfig;
use std::fs;
use std::io::Write;
use std::path::Path;
use tracing::{debug, info};

/// 命令执行器
///
/// 每个命令读取整个文件，按顺序遍历其中首尾相接的文档，结果写入 `out`。
pub struct Cli {
    config: BsonkitConfig,
    formatter: Formatter,
}

impl Cli {
    pub fn new(config: BsonkitConfig, color: bool) -> Self {
        Self {
            config,
            formatter: Formatter::new(color),
        }
    }

    /// 缩进打印每个文档
    pub fn dump(&self, path: &Path, out: &mut impl Write) -> CliResult<()> {
        let data = read_file(path)?;
        let printer = Printer::from_config(&self.config.codec);

        for_each_document(&data, |index, offset, doc| {
            let text = printer.render(doc).map_err(|source| CliError::Decode {
                index,
                offset,
                source,
            })?;
            writeln!(out, "{}", self.formatter.document_header(index, offset, doc.len()))?;
            writeln!(out, "{}", text)?;
            Ok(())
        })
    }

    /// 每个文档输出一行宽松扩展 JSON，`pretty` 时多行缩进
    pub fn json(&self, path: &Path, pretty: bool, out: &mut impl Write) -> CliResult<()> {
        let data = read_file(path)?;
        let max_depth = self.config.codec.max_nesting_depth;

        for_each_document(&data, |index, offset, doc| {
            let value =
                to_relaxed_json_with_depth(doc, max_depth).map_err(|source| CliError::Decode {
                    index,
                    offset,
                    source,
                })?;
            let text = if pretty {
                serde_json::to_string_pretty(&value)?
            } else {
                serde_json::to_string(&value)?
            };
            writeln!(out, "{}", text)?;
            Ok(())
        })
    }

    pub fn stats(&self, path: &Path, out: &mut impl Write) -> CliResult<()> {
        let data = read_file(path)?;
        let max_depth = self.config.codec.max_nesting_depth;
        let mut stats = Stats::new();

        for_each_document(&data, |index, offset, doc| {
            stats
                .add_document(doc, max_depth)
                .map_err(|source| CliError::Decode {
                    index,
                    offset,
                    source,
                })
        })?;

        info!(documents = stats.documents, bytes = stats.bytes, "stats collected");
        write!(out, "{}", self.formatter.stats(&stats))?;
        Ok(())
    }
}

fn read_file(path: &Path) -> CliResult<Vec<u8>> {
    let data = fs::read(path)?;
    debug!(path = %path.display(), bytes = data.len(), "file loaded");
    Ok(data)
}

/// 遍历文件中的文档，任何错误都附带文档序号与偏移后中止
fn for_each_document<'a, F>(data: &'a [u8], mut f: F) -> CliResult<()>
where
    F: FnMut(usize, usize, RawDocument<'a>) -> CliResult<()>,
{
    let mut stream = DocumentStream::new(data);
    loop {
        let index = stream.index();
        let offset = stream.offset();
        match stream.next() {
            None => return Ok(()),
            Some(Ok(doc)) => f(index, offset, doc)?,
            Some(Err(source)) => {
                return Err(CliError::Decode {
                    index,
                    offset,
                    source,
                })
            }
        }
    }
}
