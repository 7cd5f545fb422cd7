/// Wavefront OBJ reader for polygon meshes with face normals
use nom::{
    bytes::complete::tag,
    character::complete::{char, digit1, space0, space1},
    combinator::{all_consuming, map_res, opt, recognize, verify},
    multi::separated_list1,
    number::complete::double,
    sequence::{pair, preceded, terminated, tuple},
    IResult,
};

use crate::error::{RenderError, Result};
use crate::math::Vec3;
use crate::mesh::{Face, Mesh};

/// One vertex slot of an `f` statement: position, texture and normal references.
#[derive(Debug, Clone, Copy, PartialEq)]
struct FaceRef {
    vertex: i64,
    normal: Option<i64>,
}

#[derive(Debug, Clone, PartialEq)]
enum Statement {
    Vertex(Vec3),
    Normal(Vec3),
    Face(Vec<FaceRef>),
}

/// Parse OBJ text into a mesh.
///
/// Each face takes the normal referenced by its first slot. When any face
/// has no normal reference the mesh comes back without normals.
pub fn parse_obj(input: &str) -> Result<Mesh> {
    let mut vertices = Vec::new();
    let mut normal_pool = Vec::new();
    let mut faces = Vec::new();
    let mut normals = Vec::new();
    let mut all_faces_have_normals = true;

    for (line_index, raw) in input.lines().enumerate() {
        let line_no = line_index + 1;
        let line = raw.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }

        let statement = match keyword(line) {
            "v" => parse_vertex(line),
            "vn" => parse_normal(line),
            "f" => parse_face(line),
            // vt, o, g, s, mtllib, usemtl, ...
            _ => continue,
        };

        let statement = match statement {
            Ok((_, statement)) => statement,
            Err(e) => {
                return Err(RenderError::ObjParse {
                    line: line_no,
                    message: format!("malformed statement `{line}`: {e:?}"),
                })
            }
        };

        match statement {
            Statement::Vertex(v) => vertices.push(v),
            Statement::Normal(n) => normal_pool.push(n),
            Statement::Face(refs) => {
                let indices = refs
                    .iter()
                    .map(|r| resolve_index(r.vertex, vertices.len(), line_no))
                    .collect::<Result<Vec<_>>>()?;
                faces.push(Face::new(indices));

                match refs[0].normal {
                    Some(n) => {
                        let n = resolve_index(n, normal_pool.len(), line_no)?;
                        normals.push(normal_pool[n]);
                    }
                    None => all_faces_have_normals = false,
                }
            }
        }
    }

    if !all_faces_have_normals {
        log::debug!("OBJ faces without normal references; loading without normals");
        normals.clear();
    }

    Ok(Mesh::new(vertices, faces, normals))
}

fn keyword(line: &str) -> &str {
    line.split_whitespace().next().unwrap_or("")
}

/// Turn a 1-based or negative (relative) OBJ index into a 0-based one.
fn resolve_index(index: i64, len: usize, line: usize) -> Result<usize> {
    let resolved = if index > 0 {
        index - 1
    } else {
        len as i64 + index
    };

    if index == 0 || resolved < 0 || resolved >= len as i64 {
        return Err(RenderError::ObjParse {
            line,
            message: format!("index {index} out of range (have {len})"),
        });
    }
    Ok(resolved as usize)
}

fn coordinate(input: &str) -> IResult<&str, f64> {
    verify(double, |v: &f64| v.is_finite())(input)
}

fn vector3(input: &str) -> IResult<&str, Vec3> {
    let (input, (x, _, y, _, z)) =
        tuple((coordinate, space1, coordinate, space1, coordinate))(input)?;
    Ok((input, Vec3::new(x, y, z)))
}

fn parse_vertex(input: &str) -> IResult<&str, Statement> {
    // A trailing w component is ignored
    let (input, v) = all_consuming(terminated(
        preceded(pair(tag("v"), space1), vector3),
        pair(opt(preceded(space1, coordinate)), space0),
    ))(input)?;
    Ok((input, Statement::Vertex(v)))
}

fn parse_normal(input: &str) -> IResult<&str, Statement> {
    let (input, n) = all_consuming(terminated(
        preceded(pair(tag("vn"), space1), vector3),
        space0,
    ))(input)?;
    Ok((input, Statement::Normal(n)))
}

fn index(input: &str) -> IResult<&str, i64> {
    map_res(recognize(pair(opt(char('-')), digit1)), str::parse::<i64>)(input)
}

fn face_ref(input: &str) -> IResult<&str, FaceRef> {
    let (input, vertex) = index(input)?;
    let (input, _texture) = opt(preceded(char('/'), opt(index)))(input)?;
    let (input, normal) = opt(preceded(char('/'), opt(index)))(input)?;
    Ok((
        input,
        FaceRef {
            vertex,
            normal: normal.flatten(),
        },
    ))
}

fn parse_face(input: &str) -> IResult<&str, Statement> {
    let (input, refs) = all_consuming(terminated(
        preceded(pair(tag("f"), space1), separated_list1(space1, face_ref)),
        space0,
    ))(input)?;
    Ok((input, Statement::Face(refs)))
}
