//! Wavefront OBJ export
//!
//! Per vertex: `v X Y Z R G B` with 8-bit color, followed by `vn Nx Ny Nz`.
//! Faces come last as `f a//a b//b c//c` with 1-based indices, so a vertex
//! and its normal share one index.

use crate::error::{IsoError, IsoResult};
use crate::mesh::Mesh;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

#[inline]
fn quantize(channel: f32) -> u8 {
    (channel.clamp(0.0, 1.0) * 255.0) as u8
}

impl Mesh {
    pub fn write_obj<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        for ((p, n), c) in self.positions().iter().zip(self.normals()).zip(self.colors()) {
            writeln!(
                out,
                "v {} {} {} {} {} {}",
                p[0],
                p[1],
                p[2],
                quantize(c[0]),
                quantize(c[1]),
                quantize(c[2])
            )?;
            writeln!(out, "vn {} {} {}", n[0], n[1], n[2])?;
        }
        for t in self.triangles() {
            let [a, b, c] = t.map(|i| i + 1);
            writeln!(out, "f {a}//{a} {b}//{b} {c}//{c}")?;
        }
        Ok(())
    }

    /// Render the OBJ text in memory
    pub fn to_obj(&self) -> String {
        let mut buf = Vec::new();
        self.write_obj(&mut buf)
            .expect("writing to a Vec<u8> cannot fail");
        String::from_utf8(buf).expect("OBJ output is ASCII")
    }

    pub fn export_obj(&self, path: impl AsRef<Path>) -> IsoResult<()> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| IsoError::io(path, e))?;
        let mut writer = BufWriter::new(file);
        self.write_obj(&mut writer)
            .and_then(|_| writer.flush())
            .map_err(|e| IsoError::io(path, e))?;
        tracing::info!(
            "Wrote {} vertices and {} triangles to {}",
            self.vertex_count(),
            self.triangle_count(),
            path.display()
        );
        Ok(())
    }
}
