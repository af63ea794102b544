use std::fs::File;
use std::io::{self, Write as _};
use std::path::Path;

use nalgebra::DVector;

use crate::discretization::mesh::{Location, Mesh};

/// Write columns of data to a CSV file with headers.
pub fn write_csv<P: AsRef<Path>>(path: P, headers: &[&str], data: &[Vec<f64>]) -> io::Result<()> {
    if !headers.is_empty() && !data.is_empty() && headers.len() != data.len() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!(
                "Headers count ({}) doesn't match data columns ({})",
                headers.len(),
                data.len()
            ),
        ));
    }

    let mut file = File::create(path)?;
    writeln!(file, "{}", headers.join(","))?;

    let n_rows = data.iter().map(|col| col.len()).max().unwrap_or(0);
    for i in 0..n_rows {
        let row: Vec<String> = data
            .iter()
            .map(|col| {
                if i < col.len() {
                    format!("{:.15e}", col[i])
                } else {
                    String::new()
                }
            })
            .collect();
        writeln!(file, "{}", row.join(","))?;
    }

    Ok(())
}

/// Write x-y data pairs.
pub fn write_xy<P: AsRef<Path>>(
    path: P,
    x_header: &str,
    y_header: &str,
    x_data: &[f64],
    y_data: &[f64],
) -> io::Result<()> {
    if x_data.len() != y_data.len() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!(
                "X and Y data lengths don't match ({} vs {})",
                x_data.len(),
                y_data.len()
            ),
        ));
    }
    write_csv(
        path,
        &[x_header, y_header],
        &[x_data.to_vec(), y_data.to_vec()],
    )
}

/// Mesh-aware artifact writer: emits point coordinates, the classification
/// tag and any number of named mesh-aligned vectors to `<filename>.csv`.
pub struct Writer<'a> {
    mesh: &'a Mesh,
    filename: String,
    columns: Vec<(String, &'a DVector<f64>)>,
    include_exterior: bool,
}

impl<'a> Writer<'a> {
    pub fn new(mesh: &'a Mesh) -> Self {
        Self {
            mesh,
            filename: "solution".to_string(),
            columns: Vec::new(),
            include_exterior: false,
        }
    }

    pub fn set_filename(&mut self, name: impl Into<String>) {
        self.filename = name.into();
    }

    pub fn add_vector(&mut self, name: impl Into<String>, v: &'a DVector<f64>) {
        self.columns.push((name.into(), v));
    }

    /// Also write points outside the embedded domain.
    pub fn set_include_exterior(&mut self, on: bool) {
        self.include_exterior = on;
    }

    pub fn write(&self) -> io::Result<()> {
        for (name, v) in &self.columns {
            if v.len() != self.mesh.num_points() {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!(
                        "Column '{}' has {} entries for {} mesh points",
                        name,
                        v.len(),
                        self.mesh.num_points()
                    ),
                ));
            }
        }

        let mut file = File::create(format!("{}.csv", self.filename))?;

        let names: Vec<&str> = self.columns.iter().map(|(n, _)| n.as_str()).collect();
        writeln!(file, "x,y,z,location,{}", names.join(","))?;

        for p in self.mesh.points() {
            if !self.include_exterior && p.location() == Location::Exterior {
                continue;
            }
            let tag = match p.location() {
                Location::Interior => "interior",
                Location::Border => "border",
                Location::Exterior => "exterior",
            };
            let values: Vec<String> = self
                .columns
                .iter()
                .map(|(_, v)| format!("{:.15e}", v[p.index()]))
                .collect();
            writeln!(
                file,
                "{:.15e},{:.15e},{:.15e},{},{}",
                p.x(),
                p.y(),
                p.z(),
                tag,
                values.join(",")
            )?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DVec3;
    use std::fs;

    #[test]
    fn writer_emits_one_row_per_point() {
        let mut mesh = Mesh::new();
        mesh.set_bounds(DVec3::ZERO, DVec3::new(1.0, 0.0, 0.0));
        mesh.set_nx(5);
        mesh.build().unwrap();

        let v = DVector::from_element(5, 1.5);
        let mut writer = Writer::new(&mesh);
        writer.set_filename("test_writer_output");
        writer.add_vector("u", &v);
        writer.set_include_exterior(true);
        writer.write().unwrap();

        let content = fs::read_to_string("test_writer_output.csv").unwrap();
        assert!(content.starts_with("x,y,z,location,u"));
        assert_eq!(content.lines().count(), 6);

        fs::remove_file("test_writer_output.csv").ok();
    }

    #[test]
    fn exterior_points_are_skipped_by_default() {
        let mut mesh = Mesh::new();
        mesh.set_bounds(DVec3::ZERO, DVec3::new(1.0, 0.0, 0.0));
        mesh.set_nx(5);
        mesh.build().unwrap();
        mesh.set_location(0, Location::Exterior);
        mesh.set_location(4, Location::Exterior);

        let v = DVector::from_element(5, 0.0);
        let mut writer = Writer::new(&mesh);
        writer.set_filename("test_writer_filtered");
        writer.add_vector("u", &v);
        writer.write().unwrap();

        let content = fs::read_to_string("test_writer_filtered.csv").unwrap();
        assert_eq!(content.lines().count(), 4);

        fs::remove_file("test_writer_filtered.csv").ok();
    }

    #[test]
    fn mismatched_column_is_rejected() {
        let mut mesh = Mesh::new();
        mesh.set_bounds(DVec3::ZERO, DVec3::new(1.0, 0.0, 0.0));
        mesh.set_nx(5);
        mesh.build().unwrap();

        let v = DVector::from_element(4, 0.0);
        let mut writer = Writer::new(&mesh);
        writer.add_vector("u", &v);
        assert!(writer.write().is_err());
    }
}
