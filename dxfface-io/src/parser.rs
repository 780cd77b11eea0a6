//! DXF 图元解析：把组码/值流切分为图元记录与组结束标记。
//!
//! 只识别 LINE、CIRCLE、ARC、POLYLINE（含 VERTEX/SEQEND）与 SPLINE。
//! 每个 ENDSEC 都结束当前重建组。重建只在 XY 平面内进行：
//! 直线、圆、圆弧与顶点的 Z 被置零，不在工作平面内的记录以空记录返回。

use dxfface_core::geometry::{Point2, Vector3};
use dxfface_core::primitive::{
    Arc, Circle, Line, Polyline, Primitive, PrimitiveKind, Spline, Vertex,
};
use tracing::debug;

use crate::reader::{DxfError, DxfReader, assign_coord, parse_f64, parse_i16, parse_i32};

const POLYGON_MESH: i16 = 0x10;
const POLYFACE_MESH: i16 = 0x40;

/// 解析器产出的事件。
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ParseEvent {
    Primitive(Primitive),
    EndOfGroup,
    /// 位于实体段中但不参与重建的实体类型。
    Unsupported(String),
    /// 实体取值无效，整条实体被跳过。
    Malformed {
        kind: PrimitiveKind,
        line: usize,
        message: String,
    },
}

pub(crate) struct DxfParser<'a> {
    reader: DxfReader<'a>,
    section: Option<String>,
}

impl<'a> DxfParser<'a> {
    pub(crate) fn new(source: &'a str) -> Self {
        Self {
            reader: DxfReader::new(source),
            section: None,
        }
    }

    pub(crate) fn line_number(&self) -> usize {
        self.reader.line_number()
    }

    /// 读取下一个事件；流结束或遇到 EOF 时返回 `None`。
    /// `Err` 只表示组码/值行损坏，调用方应停止读取。
    pub(crate) fn next_event(&mut self) -> Result<Option<ParseEvent>, DxfError> {
        loop {
            let Some((code, value)) = self.reader.next_pair()? else {
                return Ok(None);
            };
            if code != 0 {
                if code == 2 && self.section.as_deref() == Some("") {
                    self.section = Some(value.trim().to_string());
                }
                continue;
            }

            let keyword = value.trim();
            if let Some(kind) = PrimitiveKind::from_keyword(keyword) {
                return self.parse_primitive(kind).map(Some);
            }
            match keyword {
                "ENDSEC" => {
                    self.section = None;
                    return Ok(Some(ParseEvent::EndOfGroup));
                }
                "EOF" => return Ok(None),
                // 段名随后以组码 2 给出
                "SECTION" => self.section = Some(String::new()),
                "SEQEND" | "VERTEX" | "BLOCK" | "ENDBLK" => {}
                other if self.in_entity_section() => {
                    let other = other.to_string();
                    self.skip_entity_body()?;
                    return Ok(Some(ParseEvent::Unsupported(other)));
                }
                _ => {}
            }
        }
    }

    fn in_entity_section(&self) -> bool {
        matches!(self.section.as_deref(), Some("ENTITIES" | "BLOCKS"))
    }

    fn parse_primitive(&mut self, kind: PrimitiveKind) -> Result<ParseEvent, DxfError> {
        let line = self.reader.line_number();
        let parsed = match kind {
            PrimitiveKind::Line => self.parse_line(),
            PrimitiveKind::Circle => self.parse_circle(),
            PrimitiveKind::Arc => self.parse_arc(),
            PrimitiveKind::Polyline => self.parse_polyline(),
            PrimitiveKind::Spline => self.parse_spline(),
        };
        match parsed {
            Ok(primitive) => {
                debug!(kind = %kind, line, "已解析图元");
                Ok(ParseEvent::Primitive(primitive))
            }
            Err(DxfError::Malformed { message }) => {
                self.skip_entity_body()?;
                if kind == PrimitiveKind::Polyline {
                    self.skip_polyline_sequence()?;
                }
                Ok(ParseEvent::Malformed {
                    kind,
                    line,
                    message,
                })
            }
            Err(err) => Err(err),
        }
    }

    fn parse_line(&mut self) -> Result<Primitive, DxfError> {
        let mut start_x = None;
        let mut start_y = None;
        let mut start_z = None;
        let mut end_x = None;
        let mut end_y = None;
        let mut end_z = None;
        while let Some((code, value)) = self.next_body_pair()? {
            match code {
                10 => assign_coord(&mut start_x, &value, "LINE 起点 X（组码 10）")?,
                20 => assign_coord(&mut start_y, &value, "LINE 起点 Y（组码 20）")?,
                30 => assign_coord(&mut start_z, &value, "LINE 起点 Z（组码 30）")?,
                11 => assign_coord(&mut end_x, &value, "LINE 终点 X（组码 11）")?,
                21 => assign_coord(&mut end_y, &value, "LINE 终点 Y（组码 21）")?,
                31 => assign_coord(&mut end_z, &value, "LINE 终点 Z（组码 31）")?,
                _ => {}
            }
        }

        let sx = start_x.ok_or_else(|| DxfError::malformed("LINE 缺少起点 X（组码 10）"))?;
        let sy = start_y.ok_or_else(|| DxfError::malformed("LINE 缺少起点 Y（组码 20）"))?;
        let ex = end_x.ok_or_else(|| DxfError::malformed("LINE 缺少终点 X（组码 11）"))?;
        let ey = end_y.ok_or_else(|| DxfError::malformed("LINE 缺少终点 Y（组码 21）"))?;

        if start_z.unwrap_or(0.0) != end_z.unwrap_or(0.0) {
            debug!("LINE 起点与终点 Z 不同，不在工作平面内");
            let origin = Point2::new(0.0, 0.0);
            return Ok(Primitive::Line(Line::new(origin, origin)));
        }
        Ok(Primitive::Line(Line::new(
            Point2::new(sx, sy),
            Point2::new(ex, ey),
        )))
    }

    fn parse_circle(&mut self) -> Result<Primitive, DxfError> {
        let (center, radius) = self.parse_circle_fields("CIRCLE", None)?;
        Ok(Primitive::Circle(Circle::new(center, radius)))
    }

    fn parse_arc(&mut self) -> Result<Primitive, DxfError> {
        let mut angles = (None, None);
        let (center, radius) = self.parse_circle_fields("ARC", Some(&mut angles))?;
        let start_angle = angles
            .0
            .ok_or_else(|| DxfError::malformed("ARC 缺少起始角（组码 50）"))?;
        let end_angle = angles
            .1
            .ok_or_else(|| DxfError::malformed("ARC 缺少终止角（组码 51）"))?;
        Ok(Primitive::Arc(Arc::new(center, radius, start_angle, end_angle)))
    }

    // CIRCLE 与 ARC 共用圆心和半径字段，ARC 额外读取以度为单位的起止角。
    fn parse_circle_fields(
        &mut self,
        entity: &str,
        mut angles: Option<&mut (Option<f64>, Option<f64>)>,
    ) -> Result<(Point2, f64), DxfError> {
        let mut center_x = None;
        let mut center_y = None;
        let mut center_z = None;
        let mut radius = None;
        while let Some((code, value)) = self.next_body_pair()? {
            match (code, angles.as_deref_mut()) {
                (10, _) => assign_coord(&mut center_x, &value, &format!("{entity} 圆心 X（组码 10）"))?,
                (20, _) => assign_coord(&mut center_y, &value, &format!("{entity} 圆心 Y（组码 20）"))?,
                (30, _) => assign_coord(&mut center_z, &value, &format!("{entity} 圆心 Z（组码 30）"))?,
                (40, _) => assign_coord(&mut radius, &value, &format!("{entity} 半径（组码 40）"))?,
                (50, Some((start, _))) => {
                    assign_coord(start, &value, &format!("{entity} 起始角（组码 50）"))?
                }
                (51, Some((_, end))) => {
                    assign_coord(end, &value, &format!("{entity} 终止角（组码 51）"))?
                }
                _ => {}
            }
        }

        let cx = center_x
            .ok_or_else(|| DxfError::malformed(format!("{entity} 缺少圆心 X（组码 10）")))?;
        let cy = center_y
            .ok_or_else(|| DxfError::malformed(format!("{entity} 缺少圆心 Y（组码 20）")))?;
        let radius =
            radius.ok_or_else(|| DxfError::malformed(format!("{entity} 缺少半径（组码 40）")))?;
        Ok((Point2::new(cx, cy), radius))
    }

    fn parse_polyline(&mut self) -> Result<Primitive, DxfError> {
        let mut flags: i16 = 0;
        while let Some((code, value)) = self.next_body_pair()? {
            if code == 70 {
                flags = parse_i16(&value, "POLYLINE 标志（组码 70）")?;
            }
        }

        let mut polyline = Polyline::new();
        let mut elevation: Option<f64> = None;
        let mut planar = true;
        loop {
            match self.reader.next_pair()? {
                Some((0, value)) => match value.trim() {
                    "VERTEX" => {
                        let (vertex, z) = self.parse_vertex()?;
                        match elevation {
                            None => elevation = Some(z),
                            Some(first) if first != z => planar = false,
                            Some(_) => {}
                        }
                        if !polyline.push_vertex(vertex) {
                            debug!(
                                x = vertex.position.x(),
                                y = vertex.position.y(),
                                "POLYLINE 跳过重复顶点"
                            );
                        }
                    }
                    "SEQEND" => {
                        self.skip_entity_body()?;
                        break;
                    }
                    _ => {
                        self.reader.put_back((0, value));
                        break;
                    }
                },
                Some(_) => continue,
                None => break,
            }
        }

        if flags & (POLYGON_MESH | POLYFACE_MESH) != 0 {
            debug!(flags, "POLYLINE 为网格，不参与轮廓重建");
            return Ok(Primitive::Polyline(Polyline::new()));
        }
        if !planar {
            debug!("POLYLINE 顶点 Z 不一致，不在工作平面内");
            return Ok(Primitive::Polyline(Polyline::new()));
        }
        Ok(Primitive::Polyline(polyline))
    }

    fn parse_vertex(&mut self) -> Result<(Vertex, f64), DxfError> {
        let mut x = None;
        let mut y = None;
        let mut z = None;
        while let Some((code, value)) = self.next_body_pair()? {
            match code {
                10 => assign_coord(&mut x, &value, "VERTEX X（组码 10）")?,
                20 => assign_coord(&mut y, &value, "VERTEX Y（组码 20）")?,
                30 => assign_coord(&mut z, &value, "VERTEX Z（组码 30）")?,
                _ => {}
            }
        }
        let x = x.ok_or_else(|| DxfError::malformed("VERTEX 缺少 X（组码 10）"))?;
        let y = y.ok_or_else(|| DxfError::malformed("VERTEX 缺少 Y（组码 20）"))?;
        Ok((Vertex::new(x, y), z.unwrap_or(0.0)))
    }

    fn parse_spline(&mut self) -> Result<Primitive, DxfError> {
        let mut spline = Spline::default();
        let mut degree = None;
        let mut normal = (0.0, 0.0, 0.0);
        let mut pending_control_x: Option<f64> = None;
        let mut pending_fit_x: Option<f64> = None;

        while let Some((code, value)) = self.next_body_pair()? {
            match code {
                71 => degree = Some(parse_i32(&value, "SPLINE 阶数（组码 71）")?),
                72 => spline.knot_count = parse_i32(&value, "SPLINE 节点数（组码 72）")?,
                73 => spline.control_point_count = parse_i32(&value, "SPLINE 控制点数（组码 73）")?,
                74 => spline.fit_point_count = parse_i32(&value, "SPLINE 拟合点数（组码 74）")?,
                40 => spline.knots.push(parse_f64(&value, "SPLINE 节点值（组码 40）")?),
                10 => {
                    if pending_control_x
                        .replace(parse_f64(&value, "SPLINE 控制点 X（组码 10）")?)
                        .is_some()
                    {
                        return Err(DxfError::malformed(
                            "SPLINE 控制点 X（组码 10）在未提供 Y 之前重复出现",
                        ));
                    }
                }
                20 => {
                    let y = parse_f64(&value, "SPLINE 控制点 Y（组码 20）")?;
                    let x = pending_control_x.take().ok_or_else(|| {
                        DxfError::malformed("SPLINE 控制点 Y（组码 20）缺少对应的 X")
                    })?;
                    spline.control_points.push(Point2::new(x, y));
                }
                11 => {
                    if pending_fit_x
                        .replace(parse_f64(&value, "SPLINE 拟合点 X（组码 11）")?)
                        .is_some()
                    {
                        return Err(DxfError::malformed(
                            "SPLINE 拟合点 X（组码 11）在未提供 Y 之前重复出现",
                        ));
                    }
                }
                21 => {
                    let y = parse_f64(&value, "SPLINE 拟合点 Y（组码 21）")?;
                    let x = pending_fit_x.take().ok_or_else(|| {
                        DxfError::malformed("SPLINE 拟合点 Y（组码 21）缺少对应的 X")
                    })?;
                    spline.fit_points.push(Point2::new(x, y));
                }
                210 => normal.0 = parse_f64(&value, "SPLINE 法向 X（组码 210）")?,
                220 => normal.1 = parse_f64(&value, "SPLINE 法向 Y（组码 220）")?,
                230 => normal.2 = parse_f64(&value, "SPLINE 法向 Z（组码 230）")?,
                // 权重、切向与 Z 分量不参与平面重建
                _ => {}
            }
        }

        if let Some(x) = pending_control_x {
            return Err(DxfError::malformed(format!(
                "SPLINE 控制点 X={x} 缺少对应的 Y（组码 20）"
            )));
        }
        if let Some(x) = pending_fit_x {
            return Err(DxfError::malformed(format!(
                "SPLINE 拟合点 X={x} 缺少对应的 Y（组码 21）"
            )));
        }

        spline.degree = degree.ok_or_else(|| DxfError::malformed("SPLINE 缺少阶数（组码 71）"))?;
        spline.normal = Vector3::new(normal.0, normal.1, normal.2);
        if !spline.is_planar() {
            debug!(
                nx = normal.0,
                ny = normal.1,
                nz = normal.2,
                "SPLINE 法向不沿 Z 轴，不在工作平面内"
            );
            spline.clear_geometry();
        }
        Ok(Primitive::Spline(spline))
    }

    /// 读取实体内部的下一组；遇到下一个组码 0 时回退并返回 `None`。
    fn next_body_pair(&mut self) -> Result<Option<(i32, String)>, DxfError> {
        match self.reader.next_pair()? {
            Some((0, value)) => {
                self.reader.put_back((0, value));
                Ok(None)
            }
            other => Ok(other),
        }
    }

    fn skip_entity_body(&mut self) -> Result<(), DxfError> {
        while self.next_body_pair()?.is_some() {}
        Ok(())
    }

    fn skip_polyline_sequence(&mut self) -> Result<(), DxfError> {
        loop {
            match self.reader.next_pair()? {
                Some((0, value)) => match value.trim() {
                    "VERTEX" => self.skip_entity_body()?,
                    "SEQEND" => {
                        self.skip_entity_body()?;
                        break;
                    }
                    _ => {
                        self.reader.put_back((0, value));
                        break;
                    }
                },
                Some(_) => continue,
                None => break,
            }
        }
        Ok(())
    }
}
