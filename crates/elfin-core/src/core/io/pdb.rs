use crate::core::io::traits::MolecularFile;
use crate::core::models::atom::Atom;
use crate::core::models::structure::Structure;
use nalgebra::Point3;
use std::io::{self, BufRead, Write};
use thiserror::Error;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PdbMetadata {
    /// Records preceding the first coordinate record (HEADER, REMARK, CRYST1, ...).
    pub header_lines: Vec<String>,
}

#[derive(Debug, Error)]
pub enum PdbError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {kind}")]
    Parse { line: usize, kind: PdbParseErrorKind },
    #[error("Missing required record: {0}")]
    MissingRecord(String),
    #[error("Chain label '{0}' does not fit the single-character PDB chain column")]
    ChainLabelTooLong(String),
}

#[derive(Debug, Error)]
pub enum PdbParseErrorKind {
    #[error("Invalid integer format in columns {columns} (value: '{value}')")]
    InvalidInt { columns: String, value: String },
    #[error("Invalid float format in columns {columns} (value: '{value}')")]
    InvalidFloat { columns: String, value: String },
    #[error("Required field in columns {columns} is empty")]
    MissingRequiredField { columns: String },
    #[error("Line is too short for ATOM/HETATM record (must be at least 54 chars)")]
    LineTooShort,
}

fn slice_and_trim(line: &str, start: usize, end: usize) -> &str {
    line.get(start..end.min(line.len())).unwrap_or("").trim()
}

fn parse_float(line: &str, line_num: usize, start: usize, end: usize) -> Result<f64, PdbError> {
    let value = slice_and_trim(line, start, end);
    value.parse().map_err(|_| PdbError::Parse {
        line: line_num,
        kind: PdbParseErrorKind::InvalidFloat {
            columns: format!("{}-{}", start + 1, end),
            value: value.into(),
        },
    })
}

fn parse_optional_float(line: &str, start: usize, end: usize, default: f64) -> f64 {
    slice_and_trim(line, start, end).parse().unwrap_or(default)
}

/// Formats an atom name for columns 13-16.
///
/// Names shorter than four characters with a one-letter element start in column 14,
/// unless they begin with a digit (`1H`, `2HB`).
fn format_atom_name(name: &str, element: &str) -> String {
    let leading_digit = name.chars().next().is_some_and(|c| c.is_ascii_digit());
    if name.len() >= 4 || element.len() > 1 || leading_digit {
        format!("{:<4}", name)
    } else {
        format!(" {:<3}", name)
    }
}

pub struct PdbFile;

impl MolecularFile for PdbFile {
    type Metadata = PdbMetadata;
    type Error = PdbError;

    fn read_from(reader: &mut impl BufRead) -> Result<(Structure, Self::Metadata), Self::Error> {
        let mut structure = Structure::new();
        let mut metadata = PdbMetadata::default();
        let mut atom_count = 0usize;
        let mut seen_coordinates = false;

        for (line_num, line_res) in reader.lines().enumerate() {
            let line = line_res?;
            let line_num = line_num + 1;
            let record_type = slice_and_trim(&line, 0, 6);

            match record_type {
                "ATOM" | "HETATM" => {
                    seen_coordinates = true;
                    if line.len() < 54 {
                        return Err(PdbError::Parse {
                            line: line_num,
                            kind: PdbParseErrorKind::LineTooShort,
                        });
                    }

                    let alt_loc = slice_and_trim(&line, 16, 17);
                    if !alt_loc.is_empty() && alt_loc != "A" {
                        continue;
                    }

                    let name = slice_and_trim(&line, 12, 16);
                    if name.is_empty() {
                        return Err(PdbError::Parse {
                            line: line_num,
                            kind: PdbParseErrorKind::MissingRequiredField {
                                columns: "13-16".into(),
                            },
                        });
                    }
                    let res_name = slice_and_trim(&line, 17, 20);
                    let chain_label = match slice_and_trim(&line, 21, 22) {
                        "" => "A",
                        label => label,
                    };
                    let res_seq_str = slice_and_trim(&line, 22, 26);
                    let res_seq: isize = res_seq_str.parse().map_err(|_| PdbError::Parse {
                        line: line_num,
                        kind: PdbParseErrorKind::InvalidInt {
                            columns: "23-26".into(),
                            value: res_seq_str.into(),
                        },
                    })?;

                    let x = parse_float(&line, line_num, 30, 38)?;
                    let y = parse_float(&line, line_num, 38, 46)?;
                    let z = parse_float(&line, line_num, 46, 54)?;

                    let mut atom =
                        Atom::new(name, Point3::new(x, y, z)).with_element(slice_and_trim(
                            &line, 76, 78,
                        ));
                    atom.occupancy = parse_optional_float(&line, 54, 60, 1.0);
                    atom.b_factor = parse_optional_float(&line, 60, 66, 0.0);

                    let chain_id = structure.add_chain(chain_label);
                    let residue_id = structure
                        .add_residue(chain_id, res_seq, res_name)
                        .ok_or_else(|| PdbError::MissingRecord(format!("chain {}", chain_label)))?;
                    structure.add_atom_to_residue(residue_id, atom);
                    atom_count += 1;
                }
                "ENDMDL" | "END" => break,
                "TER" | "ANISOU" | "CONECT" | "MASTER" | "MODEL" => {}
                _ if !seen_coordinates && !line.trim().is_empty() => {
                    metadata.header_lines.push(line);
                }
                _ => {}
            }
        }

        if atom_count == 0 {
            return Err(PdbError::MissingRecord("ATOM/HETATM records".into()));
        }
        Ok((structure, metadata))
    }

    fn write_to(
        structure: &Structure,
        metadata: &Self::Metadata,
        writer: &mut impl Write,
    ) -> Result<(), Self::Error> {
        for line in &metadata.header_lines {
            writeln!(writer, "{}", line)?;
        }

        let mut serial = 0usize;
        for (_, chain) in structure.chains() {
            if chain.label.chars().count() > 1 {
                return Err(PdbError::ChainLabelTooLong(chain.label.clone()));
            }
            let mut last_residue = None;
            for &residue_id in chain.residues() {
                let Some(residue) = structure.residue(residue_id) else {
                    continue;
                };
                for &atom_id in residue.atoms() {
                    let Some(atom) = structure.atom(atom_id) else {
                        continue;
                    };
                    serial += 1;
                    writeln!(
                        writer,
                        "{:<6}{:>5} {} {:>3} {:1}{:>4}    {:>8.3}{:>8.3}{:>8.3}{:>6.2}{:>6.2}          {:>2}",
                        "ATOM",
                        serial % 100_000,
                        format_atom_name(&atom.name, &atom.element),
                        residue.name,
                        chain.label,
                        residue.number,
                        atom.position.x,
                        atom.position.y,
                        atom.position.z,
                        atom.occupancy,
                        atom.b_factor,
                        atom.element,
                    )?;
                }
                last_residue = Some(residue);
            }
            if let Some(residue) = last_residue {
                serial += 1;
                writeln!(
                    writer,
                    "{:<6}{:>5}      {:>3} {:1}{:>4}",
                    "TER",
                    serial % 100_000,
                    residue.name,
                    chain.label,
                    residue.number
                )?;
            }
        }

        writeln!(writer, "END")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufReader, Cursor};

    const SAMPLE: &str = "\
HEADER    DE NOVO PROTEIN                         01-JAN-18   XXXX
REMARK   1 RELAXED MODULE
ATOM      1  N   GLY A   1      -6.778  -1.424   4.200  1.00  0.00           N
ATOM      2  CA  GLY A   1      -5.535  -0.826   4.645  1.00  0.00           C
ATOM      3  C   GLY A   1      -4.449  -1.078   3.614  1.00 12.50           C
ATOM      4 1H   GLY A   1      -7.105  -0.900   3.400  1.00  0.00           H
ATOM      5  N  AALA A   2      -4.600  -0.700   2.400  0.60  0.00           N
ATOM      6  N  BALA A   2      -4.650  -0.720   2.410  0.40  0.00           N
ATOM      7  CA  ALA A   2      -3.550  -0.900   1.380  1.00  0.00           C
TER       8      ALA A   2
ATOM      9  CA  SER B   5       1.000   2.000   3.000  1.00  0.00           C
END
";

    fn read_sample() -> (Structure, PdbMetadata) {
        let mut reader = BufReader::new(Cursor::new(SAMPLE));
        PdbFile::read_from(&mut reader).unwrap()
    }

    #[test]
    fn read_parses_chains_residues_and_atoms() {
        let (structure, metadata) = read_sample();
        assert_eq!(structure.chain_labels(), vec!["A", "B"]);
        let chain_a = structure.find_chain("A").unwrap();
        assert_eq!(structure.residue_count(chain_a), 2);
        assert_eq!(structure.atom_count(), 7);
        assert_eq!(metadata.header_lines.len(), 2);

        let residues = structure.residues_of(chain_a);
        assert_eq!(residues[0].name, "GLY");
        assert_eq!(residues[0].atom("C").unwrap().b_factor, 12.5);
        assert_eq!(residues[0].atom("1H").unwrap().element, "H");
        assert_eq!(
            residues[0].ca_position(),
            Some(Point3::new(-5.535, -0.826, 4.645))
        );
    }

    #[test]
    fn read_keeps_only_primary_alternate_location() {
        let (structure, _) = read_sample();
        let chain_a = structure.find_chain("A").unwrap();
        let ala = &structure.residues_of(chain_a)[1];
        assert_eq!(ala.atoms_named("N").count(), 1);
        assert_eq!(ala.atom("N").unwrap().occupancy, 0.6);
    }

    #[test]
    fn read_rejects_bad_coordinates() {
        let bad = "ATOM      1  CA  GLY A   1      -5.5x5  -0.826   4.645  1.00  0.00           C\n";
        let mut reader = BufReader::new(Cursor::new(bad));
        let err = PdbFile::read_from(&mut reader).unwrap_err();
        assert!(matches!(
            err,
            PdbError::Parse {
                line: 1,
                kind: PdbParseErrorKind::InvalidFloat { .. }
            }
        ));
    }

    #[test]
    fn read_rejects_file_without_atoms() {
        let mut reader = BufReader::new(Cursor::new("HEADER    EMPTY\nEND\n"));
        assert!(matches!(
            PdbFile::read_from(&mut reader),
            Err(PdbError::MissingRecord(_))
        ));
    }

    #[test]
    fn write_then_read_preserves_coordinates_and_names() {
        let (structure, metadata) = read_sample();
        let mut buffer = Vec::new();
        PdbFile::write_to(&structure, &metadata, &mut buffer).unwrap();
        let text = String::from_utf8(buffer.clone()).unwrap();
        assert!(text.starts_with("HEADER"));
        assert!(text.contains("ATOM      2  CA  GLY A   1"));
        assert!(text.contains("ATOM      4 1H   GLY A   1"));
        assert!(text.trim_end().ends_with("END"));

        let mut reader = BufReader::new(Cursor::new(buffer));
        let (reread, _) = PdbFile::read_from(&mut reader).unwrap();
        assert_eq!(reread.atom_count(), structure.atom_count());
        let chain_b = reread.find_chain("B").unwrap();
        assert_eq!(
            reread.ca_positions(chain_b).unwrap(),
            vec![Point3::new(1.0, 2.0, 3.0)]
        );
    }

    #[test]
    fn write_refuses_multi_character_chain_labels() {
        let mut structure = Structure::new();
        let chain = structure.add_chain("10");
        let residue = structure.add_residue(chain, 1, "GLY").unwrap();
        structure.add_atom_to_residue(residue, Atom::new("CA", Point3::origin()));
        let mut buffer = Vec::new();
        assert!(matches!(
            PdbFile::write_structure_to(&structure, &mut buffer),
            Err(PdbError::ChainLabelTooLong(label)) if label == "10"
        ));
    }
}
