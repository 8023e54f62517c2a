use crate::core::io::traits::MolecularFile;
use crate::core::models::atom::Atom;
use crate::core::models::structure::Structure;
use nalgebra::Point3;
use std::collections::HashMap;
use std::io::{self, BufRead, Write};
use thiserror::Error;

const DEFAULT_DATA_NAME: &str = "elfin";

const ATOM_SITE_COLUMNS: [&str; 18] = [
    "group_PDB",
    "id",
    "type_symbol",
    "label_atom_id",
    "label_alt_id",
    "label_comp_id",
    "label_asym_id",
    "label_entity_id",
    "label_seq_id",
    "pdbx_PDB_ins_code",
    "Cartn_x",
    "Cartn_y",
    "Cartn_z",
    "occupancy",
    "B_iso_or_equiv",
    "auth_seq_id",
    "auth_asym_id",
    "pdbx_PDB_model_num",
];

#[derive(Debug, Clone, PartialEq)]
pub struct CifMetadata {
    /// Name of the `data_` block.
    pub data_name: String,
}

impl Default for CifMetadata {
    fn default() -> Self {
        Self {
            data_name: DEFAULT_DATA_NAME.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum CifError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("No _atom_site loop found")]
    MissingAtomSite,
    #[error("_atom_site loop lacks the '{0}' column")]
    MissingColumn(&'static str),
    #[error("Row {row} of _atom_site has {found} values, expected {expected}")]
    RowLength {
        row: usize,
        found: usize,
        expected: usize,
    },
    #[error("Invalid value '{value}' for '{column}' in row {row}")]
    InvalidValue {
        row: usize,
        column: &'static str,
        value: String,
    },
    #[error("Unterminated quoted value on line {line}")]
    UnterminatedQuote { line: usize },
}

/// Splits one mmCIF data line into tokens, honouring single and double quotes.
fn tokenize(line: &str, line_num: usize) -> Result<Vec<String>, CifError> {
    let mut tokens = Vec::new();
    let mut chars = line.chars().peekable();

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }
        if c == '#' {
            break;
        }
        if c == '\'' || c == '"' {
            chars.next();
            let mut token = String::new();
            let mut closed = false;
            while let Some(inner) = chars.next() {
                let ends_token = chars.peek().is_none_or(|next| next.is_whitespace());
                if inner == c && ends_token {
                    closed = true;
                    break;
                }
                token.push(inner);
            }
            if !closed {
                return Err(CifError::UnterminatedQuote { line: line_num });
            }
            tokens.push(token);
        } else {
            let mut token = String::new();
            while let Some(&inner) = chars.peek() {
                if inner.is_whitespace() {
                    break;
                }
                token.push(inner);
                chars.next();
            }
            tokens.push(token);
        }
    }
    Ok(tokens)
}

fn quote_if_needed(value: &str) -> String {
    if value.is_empty() {
        ".".to_string()
    } else if value.contains(char::is_whitespace) || value.contains('\'') {
        format!("\"{}\"", value)
    } else {
        value.to_string()
    }
}

fn is_null(value: &str) -> bool {
    value == "." || value == "?"
}

struct AtomSiteColumns {
    atom_name: usize,
    comp: usize,
    asym: usize,
    seq: usize,
    x: usize,
    y: usize,
    z: usize,
    element: Option<usize>,
    alt: Option<usize>,
    occupancy: Option<usize>,
    b_factor: Option<usize>,
    model: Option<usize>,
}

impl AtomSiteColumns {
    fn resolve(headers: &[String]) -> Result<Self, CifError> {
        let index: HashMap<&str, usize> = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.as_str(), i))
            .collect();
        let find = |names: &[&'static str]| names.iter().find_map(|n| index.get(n).copied());
        let require = |names: &[&'static str]| find(names).ok_or(CifError::MissingColumn(names[0]));

        Ok(Self {
            atom_name: require(&["label_atom_id", "auth_atom_id"])?,
            comp: require(&["label_comp_id", "auth_comp_id"])?,
            asym: require(&["auth_asym_id", "label_asym_id"])?,
            seq: require(&["auth_seq_id", "label_seq_id"])?,
            x: require(&["Cartn_x"])?,
            y: require(&["Cartn_y"])?,
            z: require(&["Cartn_z"])?,
            element: find(&["type_symbol"]),
            alt: find(&["label_alt_id"]),
            occupancy: find(&["occupancy"]),
            b_factor: find(&["B_iso_or_equiv"]),
            model: find(&["pdbx_PDB_model_num"]),
        })
    }
}

fn parse_coordinate(
    row: &[String],
    column: usize,
    name: &'static str,
    row_num: usize,
) -> Result<f64, CifError> {
    row[column].parse().map_err(|_| CifError::InvalidValue {
        row: row_num,
        column: name,
        value: row[column].clone(),
    })
}

pub struct CifFile;

impl MolecularFile for CifFile {
    type Metadata = CifMetadata;
    type Error = CifError;

    fn read_from(reader: &mut impl BufRead) -> Result<(Structure, Self::Metadata), Self::Error> {
        let mut metadata = CifMetadata::default();
        let mut headers: Vec<String> = Vec::new();
        let mut values: Vec<String> = Vec::new();
        let mut in_loop = false;
        let mut in_atom_site = false;
        let mut atom_site_seen = false;

        for (line_num, line_res) in reader.lines().enumerate() {
            let line = line_res?;
            let trimmed = line.trim();
            let line_num = line_num + 1;

            if let Some(name) = trimmed.strip_prefix("data_") {
                if atom_site_seen {
                    break;
                }
                metadata.data_name = name.to_string();
                continue;
            }
            if trimmed == "loop_" {
                if atom_site_seen {
                    break;
                }
                in_loop = true;
                in_atom_site = false;
                continue;
            }
            if let Some(tag) = trimmed.strip_prefix("_atom_site.") {
                if in_loop && values.is_empty() {
                    in_atom_site = true;
                    atom_site_seen = true;
                    headers.push(tag.split_whitespace().next().unwrap_or(tag).to_string());
                }
                continue;
            }
            if trimmed.starts_with('_') {
                if atom_site_seen {
                    break;
                }
                in_loop = false;
                continue;
            }
            if trimmed.starts_with('#') || trimmed.is_empty() {
                if atom_site_seen && !values.is_empty() {
                    break;
                }
                continue;
            }
            if in_atom_site {
                values.extend(tokenize(trimmed, line_num)?);
            }
        }

        if headers.is_empty() {
            return Err(CifError::MissingAtomSite);
        }
        let columns = AtomSiteColumns::resolve(&headers)?;
        let width = headers.len();
        if values.len() % width != 0 {
            return Err(CifError::RowLength {
                row: values.len() / width + 1,
                found: values.len() % width,
                expected: width,
            });
        }

        let mut structure = Structure::new();
        let mut first_model: Option<String> = None;
        for (row_num, row) in values.chunks(width).enumerate() {
            let row_num = row_num + 1;
            if let Some(model_col) = columns.model {
                let model = &row[model_col];
                match &first_model {
                    None => first_model = Some(model.clone()),
                    Some(first) if first != model => break,
                    Some(_) => {}
                }
            }
            if let Some(alt_col) = columns.alt {
                let alt = row[alt_col].as_str();
                if !is_null(alt) && alt != "A" {
                    continue;
                }
            }

            let seq_value = &row[columns.seq];
            let number: isize = seq_value.parse().map_err(|_| CifError::InvalidValue {
                row: row_num,
                column: "auth_seq_id",
                value: seq_value.clone(),
            })?;
            let position = Point3::new(
                parse_coordinate(row, columns.x, "Cartn_x", row_num)?,
                parse_coordinate(row, columns.y, "Cartn_y", row_num)?,
                parse_coordinate(row, columns.z, "Cartn_z", row_num)?,
            );

            let mut atom = Atom::new(&row[columns.atom_name], position);
            if let Some(col) = columns.element.filter(|&c| !is_null(&row[c])) {
                atom = atom.with_element(&row[col]);
            }
            if let Some(col) = columns.occupancy {
                atom.occupancy = row[col].parse().unwrap_or(1.0);
            }
            if let Some(col) = columns.b_factor {
                atom.b_factor = row[col].parse().unwrap_or(0.0);
            }

            let chain_id = structure.add_chain(&row[columns.asym]);
            let residue_id = structure
                .add_residue(chain_id, number, &row[columns.comp])
                .ok_or(CifError::MissingAtomSite)?;
            structure.add_atom_to_residue(residue_id, atom);
        }

        if structure.atom_count() == 0 {
            return Err(CifError::MissingAtomSite);
        }
        Ok((structure, metadata))
    }

    fn write_to(
        structure: &Structure,
        metadata: &Self::Metadata,
        writer: &mut impl Write,
    ) -> Result<(), Self::Error> {
        writeln!(writer, "data_{}", metadata.data_name)?;
        writeln!(writer, "#")?;
        writeln!(writer, "loop_")?;
        for column in ATOM_SITE_COLUMNS {
            writeln!(writer, "_atom_site.{}", column)?;
        }

        let mut serial = 0usize;
        for (entity, (_, chain)) in structure.chains().enumerate() {
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
                        "ATOM {} {} {} . {} {} {} {} ? {:.3} {:.3} {:.3} {:.2} {:.2} {} {} 1",
                        serial,
                        quote_if_needed(&atom.element),
                        quote_if_needed(&atom.name),
                        residue.name,
                        chain.label,
                        entity + 1,
                        residue.number,
                        atom.position.x,
                        atom.position.y,
                        atom.position.z,
                        atom.occupancy,
                        atom.b_factor,
                        residue.number,
                        chain.label,
                    )?;
                }
            }
        }
        writeln!(writer, "#")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufReader, Cursor};

    const SAMPLE: &str = "\
data_test_module
#
_entry.id test_module
#
loop_
_atom_site.group_PDB
_atom_site.id
_atom_site.type_symbol
_atom_site.label_atom_id
_atom_site.label_alt_id
_atom_site.label_comp_id
_atom_site.label_asym_id
_atom_site.label_seq_id
_atom_site.Cartn_x
_atom_site.Cartn_y
_atom_site.Cartn_z
_atom_site.occupancy
_atom_site.B_iso_or_equiv
_atom_site.auth_seq_id
_atom_site.auth_asym_id
_atom_site.pdbx_PDB_model_num
ATOM 1 N N . GLY A 1 -6.778 -1.424 4.200 1.00 0.00 1 A 1
ATOM 2 C CA . GLY A 1 -5.535 -0.826 4.645 1.00 0.00 1 A 1
ATOM 3 C CA A ALA A 2 -3.550 -0.900 1.380 0.50 0.00 2 A 1
ATOM 4 C CA B ALA A 2 -3.560 -0.910 1.390 0.50 0.00 2 A 1
ATOM 5 C CA . SER AB 1 1.000 2.000 3.000 1.00 7.50 1 AB 1
ATOM 6 C CA . SER AB 1 9.000 9.000 9.000 1.00 7.50 1 AB 2
#
";

    #[test]
    fn tokenize_honours_quotes() {
        let tokens = tokenize("ATOM 1 C \"O5'\" 'a b' x", 1).unwrap();
        assert_eq!(tokens, vec!["ATOM", "1", "C", "O5'", "a b", "x"]);
        assert!(matches!(
            tokenize("ATOM 'open", 7),
            Err(CifError::UnterminatedQuote { line: 7 })
        ));
    }

    #[test]
    fn read_parses_atom_site_loop() {
        let mut reader = BufReader::new(Cursor::new(SAMPLE));
        let (structure, metadata) = CifFile::read_from(&mut reader).unwrap();
        assert_eq!(metadata.data_name, "test_module");
        assert_eq!(structure.chain_labels(), vec!["A", "AB"]);
        // Alternate location B and the second model are dropped.
        assert_eq!(structure.atom_count(), 4);
        let chain_ab = structure.find_chain("AB").unwrap();
        assert_eq!(
            structure.ca_positions(chain_ab).unwrap(),
            vec![Point3::new(1.0, 2.0, 3.0)]
        );
        let residues = structure.residues_of(chain_ab);
        assert_eq!(residues[0].atom("CA").unwrap().b_factor, 7.5);
    }

    #[test]
    fn read_without_atom_site_fails() {
        let mut reader = BufReader::new(Cursor::new("data_x\n_entry.id x\n"));
        assert!(matches!(
            CifFile::read_from(&mut reader),
            Err(CifError::MissingAtomSite)
        ));
    }

    #[test]
    fn write_then_read_supports_long_chain_labels() {
        let mut structure = Structure::new();
        let chain = structure.add_chain("AB");
        let residue = structure.add_residue(chain, 3, "LEU").unwrap();
        structure.add_atom_to_residue(residue, Atom::new("CA", Point3::new(1.5, -2.25, 3.125)));
        structure.add_atom_to_residue(residue, Atom::new("1H", Point3::new(0.0, 0.0, 0.0)));

        let mut buffer = Vec::new();
        CifFile::write_structure_to(&structure, &mut buffer).unwrap();
        let text = String::from_utf8(buffer.clone()).unwrap();
        assert!(text.starts_with("data_elfin"));

        let mut reader = BufReader::new(Cursor::new(buffer));
        let (reread, _) = CifFile::read_from(&mut reader).unwrap();
        let chain = reread.find_chain("AB").unwrap();
        let residues = reread.residues_of(chain);
        assert_eq!(residues.len(), 1);
        assert_eq!(residues[0].number, 3);
        assert_eq!(residues[0].name, "LEU");
        assert_eq!(residues[0].ca_position(), Some(Point3::new(1.5, -2.25, 3.125)));
        assert_eq!(residues[0].atom("1H").unwrap().element, "H");
    }
}
