use thiserror::Error;

/// 解析内部错误，不会越过 `DxfConverter` 向外传播。
#[derive(Debug, Error, PartialEq)]
pub(crate) enum DxfError {
    /// 组码/值行本身损坏，无法继续读取。
    #[error("第 {line} 行：{message}")]
    Stream { line: usize, message: String },
    /// 当前实体的取值无效，只影响这一个实体。
    #[error("{message}")]
    Malformed { message: String },
}

impl DxfError {
    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed {
            message: message.into(),
        }
    }
}

/// 两行一组的组码/值读取器，支持回退一组。
pub(crate) struct DxfReader<'a> {
    lines: std::str::Lines<'a>,
    buffer: Option<(i32, String)>,
    line_number: usize,
}

impl<'a> DxfReader<'a> {
    pub(crate) fn new(source: &'a str) -> Self {
        Self {
            lines: source.lines(),
            buffer: None,
            line_number: 0,
        }
    }

    pub(crate) fn line_number(&self) -> usize {
        self.line_number
    }

    pub(crate) fn next_pair(&mut self) -> Result<Option<(i32, String)>, DxfError> {
        if let Some(pair) = self.buffer.take() {
            return Ok(Some(pair));
        }

        let code_line = loop {
            match self.lines.next() {
                Some(line) => {
                    self.line_number += 1;
                    if line.trim().is_empty() {
                        let blank_line = self.line_number;
                        // 文件末尾的空行不视为组码
                        if self.skip_blank_tail() {
                            return Ok(None);
                        }
                        return Err(DxfError::Stream {
                            line: blank_line,
                            message: "组码 \"\" 无法解析为整数".to_string(),
                        });
                    }
                    break line;
                }
                None => return Ok(None),
            }
        };

        let value_line = match self.lines.next() {
            Some(line) => {
                self.line_number += 1;
                line
            }
            None => {
                return Err(DxfError::Stream {
                    line: self.line_number,
                    message: "文件结束，缺少与组码对应的值行".to_string(),
                });
            }
        };

        let code = code_line.trim().parse::<i32>().map_err(|_| DxfError::Stream {
            line: self.line_number - 1,
            message: format!("组码 \"{}\" 无法解析为整数", code_line.trim()),
        })?;
        let value = value_line.trim_end_matches('\r').to_string();
        Ok(Some((code, value)))
    }

    pub(crate) fn put_back(&mut self, pair: (i32, String)) {
        debug_assert!(self.buffer.is_none(), "DXF 组码只允许回退一次");
        self.buffer = Some(pair);
    }

    /// 消费连续空行，到达文件末尾时返回 `true`。
    fn skip_blank_tail(&mut self) -> bool {
        for line in self.lines.by_ref() {
            self.line_number += 1;
            if !line.trim().is_empty() {
                return false;
            }
        }
        true
    }
}

/// 只接受有限值；`nan` 与 `inf` 视为无效。
pub(crate) fn parse_f64(raw: &str, context: &str) -> Result<f64, DxfError> {
    let value = raw
        .trim()
        .parse::<f64>()
        .map_err(|_| DxfError::malformed(format!("{context} 解析失败（值：\"{raw}\"）")))?;
    if !value.is_finite() {
        return Err(DxfError::malformed(format!("{context} 不是有限数（值：\"{raw}\"）")));
    }
    Ok(value)
}

pub(crate) fn parse_i32(raw: &str, context: &str) -> Result<i32, DxfError> {
    raw.trim()
        .parse::<i32>()
        .map_err(|_| DxfError::malformed(format!("{context} 解析失败（值：\"{raw}\"）")))
}

pub(crate) fn parse_i16(raw: &str, context: &str) -> Result<i16, DxfError> {
    let value = parse_i32(raw, context)?;
    i16::try_from(value)
        .map_err(|_| DxfError::malformed(format!("{context} 超出 i16 范围（值：{value}）")))
}

/// 坐标分量只允许出现一次。
pub(crate) fn assign_coord(slot: &mut Option<f64>, raw: &str, context: &str) -> Result<(), DxfError> {
    if slot.is_some() {
        return Err(DxfError::malformed(format!("{context} 出现重复值")));
    }
    *slot = Some(parse_f64(raw, context)?);
    Ok(())
}
