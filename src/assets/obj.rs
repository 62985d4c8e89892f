//! Minimal Wavefront OBJ reader.
//!
//! Handles `v`, `vn`, `vt` and `f` records. Polygons are fan-triangulated,
//! negative (relative) indices are resolved, and corners without a normal
//! get the face normal. Everything else (materials, groups, smoothing) is
//! skipped.

use std::collections::HashMap;

use glam::{Vec2, Vec3};
use thiserror::Error;

use super::mesh::{MeshData, MeshVertex};

#[derive(Debug, Error, PartialEq)]
#[error("line {line}: {message}")]
pub struct ObjParseError {
    pub line: usize,
    pub message: String,
}

impl ObjParseError {
    fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

/// (position, uv, normal) indices of one face corner, zero-based.
type Corner = (usize, Option<usize>, Option<usize>);

pub fn parse_obj(text: &str) -> Result<MeshData, ObjParseError> {
    let mut positions: Vec<Vec3> = Vec::new();
    let mut normals: Vec<Vec3> = Vec::new();
    let mut uvs: Vec<Vec2> = Vec::new();

    let mut mesh = MeshData::default();
    let mut dedup: HashMap<Corner, u32> = HashMap::new();

    for (number, raw) in text.lines().enumerate() {
        let line = number + 1;
        let content = raw.split('#').next().unwrap_or("").trim();
        let mut parts = content.split_whitespace();
        let Some(tag) = parts.next() else { continue };

        match tag {
            "v" => positions.push(parse_vec3(line, &mut parts)?),
            "vn" => normals.push(parse_vec3(line, &mut parts)?),
            "vt" => {
                let u = parse_float(line, parts.next())?;
                // Some exporters omit v.
                let v = match parts.next() {
                    Some(token) => parse_float(line, Some(token))?,
                    None => 0.0,
                };
                uvs.push(Vec2::new(u, v));
            }
            "f" => {
                let corners = parts
                    .map(|token| parse_corner(line, token, positions.len(), uvs.len(), normals.len()))
                    .collect::<Result<Vec<_>, _>>()?;
                if corners.len() < 3 {
                    return Err(ObjParseError::new(line, "face has fewer than 3 corners"));
                }

                let face_normal = {
                    let a = positions[corners[0].0];
                    let b = positions[corners[1].0];
                    let c = positions[corners[2].0];
                    (b - a).cross(c - a).normalize_or_zero()
                };

                for i in 1..corners.len() - 1 {
                    for corner in [corners[0], corners[i], corners[i + 1]] {
                        let index = match corner.2 {
                            // Corners with explicit normals can be shared.
                            Some(_) => *dedup.entry(corner).or_insert_with(|| {
                                push_vertex(&mut mesh, corner, &positions, &uvs, &normals, face_normal)
                            }),
                            None => push_vertex(&mut mesh, corner, &positions, &uvs, &normals, face_normal),
                        };
                        mesh.indices.push(index);
                    }
                }
            }
            _ => {}
        }
    }

    Ok(mesh)
}

fn push_vertex(
    mesh: &mut MeshData,
    corner: Corner,
    positions: &[Vec3],
    uvs: &[Vec2],
    normals: &[Vec3],
    face_normal: Vec3,
) -> u32 {
    let (p, t, n) = corner;
    let uv = t.map(|t| uvs[t]).unwrap_or(Vec2::ZERO);
    let normal = n.map(|n| normals[n]).unwrap_or(face_normal);
    mesh.vertices
        .push(MeshVertex::new(positions[p], normal, [uv.x, 1.0 - uv.y]));
    (mesh.vertices.len() - 1) as u32
}

fn parse_float(line: usize, token: Option<&str>) -> Result<f32, ObjParseError> {
    let token = token.ok_or_else(|| ObjParseError::new(line, "missing component"))?;
    token
        .parse::<f32>()
        .map_err(|_| ObjParseError::new(line, format!("invalid number '{}'", token)))
}

fn parse_vec3<'a>(line: usize, parts: &mut impl Iterator<Item = &'a str>) -> Result<Vec3, ObjParseError> {
    Ok(Vec3::new(
        parse_float(line, parts.next())?,
        parse_float(line, parts.next())?,
        parse_float(line, parts.next())?,
    ))
}

fn resolve_index(line: usize, token: &str, count: usize, what: &str) -> Result<usize, ObjParseError> {
    let raw: i64 = token
        .parse()
        .map_err(|_| ObjParseError::new(line, format!("invalid {} index '{}'", what, token)))?;

    let resolved = if raw > 0 {
        raw - 1
    } else if raw < 0 {
        count as i64 + raw
    } else {
        -1
    };

    if resolved < 0 || resolved as usize >= count {
        return Err(ObjParseError::new(
            line,
            format!("{} index {} out of range ({} defined)", what, raw, count),
        ));
    }
    Ok(resolved as usize)
}

fn parse_corner(
    line: usize,
    token: &str,
    position_count: usize,
    uv_count: usize,
    normal_count: usize,
) -> Result<Corner, ObjParseError> {
    let mut fields = token.split('/');
    let position = resolve_index(line, fields.next().unwrap_or(""), position_count, "position")?;

    let uv = match fields.next() {
        Some("") | None => None,
        Some(t) => Some(resolve_index(line, t, uv_count, "uv")?),
    };
    let normal = match fields.next() {
        Some("") | None => None,
        Some(n) => Some(resolve_index(line, n, normal_count, "normal")?),
    };

    Ok((position, uv, normal))
}
