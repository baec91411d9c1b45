//! Fixed column schema and per-row field extraction

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;

use crate::error::{OrgTreeError, Result};

/// The 26 columns of an organizational-structure export, in file order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Jurisdiccion,
    Subjurisdiccion,
    UnidadDeNivelPolitico,
    Unidad,
    ReportaA,
    NombreCorto,
    TipoAdministracion,
    UnidadRango,
    UnidadClase,
    NormaCompetenciasObjetivos,
    CarOrden,
    Cargo,
    CarNivel,
    CarRangoJerarquia,
    CarCategoria,
    CarExtraescalafonario,
    CarEscalafon,
    CarSuplemento,
    AutoridadTratamiento,
    AutoridadNombre,
    AutoridadApellido,
    AutoridadDni,
    AutoridadCuil,
    AutoridadSexo,
    AutoridadNormaDesignacion,
    Web,
}

impl Field {
    pub const COUNT: usize = 26;

    pub const ALL: [Field; Field::COUNT] = [
        Field::Jurisdiccion,
        Field::Subjurisdiccion,
        Field::UnidadDeNivelPolitico,
        Field::Unidad,
        Field::ReportaA,
        Field::NombreCorto,
        Field::TipoAdministracion,
        Field::UnidadRango,
        Field::UnidadClase,
        Field::NormaCompetenciasObjetivos,
        Field::CarOrden,
        Field::Cargo,
        Field::CarNivel,
        Field::CarRangoJerarquia,
        Field::CarCategoria,
        Field::CarExtraescalafonario,
        Field::CarEscalafon,
        Field::CarSuplemento,
        Field::AutoridadTratamiento,
        Field::AutoridadNombre,
        Field::AutoridadApellido,
        Field::AutoridadDni,
        Field::AutoridadCuil,
        Field::AutoridadSexo,
        Field::AutoridadNormaDesignacion,
        Field::Web,
    ];

    /// Column position.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Header label as it appears in the export.
    pub fn header(self) -> &'static str {
        match self {
            Field::Jurisdiccion => "jurisdiccion",
            Field::Subjurisdiccion => "subjurisdiccion",
            Field::UnidadDeNivelPolitico => "unidad_de_nivel_politico",
            Field::Unidad => "unidad",
            Field::ReportaA => "reporta_a",
            Field::NombreCorto => "nombre_corto",
            Field::TipoAdministracion => "tipo_administracion",
            Field::UnidadRango => "unidad_rango",
            Field::UnidadClase => "unidad_clase",
            Field::NormaCompetenciasObjetivos => "norma_competencias_objetivos",
            Field::CarOrden => "car_orden",
            Field::Cargo => "cargo",
            Field::CarNivel => "car_nivel",
            Field::CarRangoJerarquia => "car_rango_jerarquia",
            Field::CarCategoria => "car_categoria",
            Field::CarExtraescalafonario => "car_extraescalafonario",
            Field::CarEscalafon => "car_escalafon",
            Field::CarSuplemento => "car_suplemento",
            Field::AutoridadTratamiento => "autoridad_tratamiento",
            Field::AutoridadNombre => "autoridad_nombre",
            Field::AutoridadApellido => "autoridad_apellido",
            Field::AutoridadDni => "autoridad_dni",
            Field::AutoridadCuil => "autoridad_cuil",
            Field::AutoridadSexo => "autoridad_sexo",
            Field::AutoridadNormaDesignacion => "autoridad_norma_designacion",
            Field::Web => "web",
        }
    }
}

/// One data row, numbered from 1.
#[derive(Debug, Clone)]
pub struct Row {
    pub number: usize,
    record: StringRecord,
}

impl Row {
    pub fn new(number: usize, record: StringRecord) -> Self {
        Row { number, record }
    }

    /// Build a row from plain values; used by callers that already hold the cells.
    pub fn from_values<S: AsRef<str>>(number: usize, values: &[S]) -> Self {
        Row::new(number, values.iter().map(|v| v.as_ref()).collect())
    }

    /// Trimmed value of `field`.
    pub fn extract(&self, field: Field) -> Result<&str> {
        self.record
            .get(field.index())
            .map(str::trim)
            .ok_or(OrgTreeError::MissingField {
                row: self.number,
                field: field.header(),
            })
    }

    /// Rejects rows whose column count differs from the schema.
    pub fn check_layout(&self) -> Result<()> {
        if self.record.len() != Field::COUNT {
            return Err(OrgTreeError::SchemaMismatch {
                row: self.number,
                detail: format!("expected {} columns, found {}", Field::COUNT, self.record.len()),
            });
        }
        Ok(())
    }
}

/// Validate a header record against the schema. With `strict_names`, each
/// label must equal the expected one (case-insensitive, trimmed).
pub fn check_header(header: &StringRecord, strict_names: bool) -> Result<()> {
    if header.len() != Field::COUNT {
        return Err(OrgTreeError::SchemaMismatch {
            row: 0,
            detail: format!("header has {} columns, expected {}", header.len(), Field::COUNT),
        });
    }
    if !strict_names {
        return Ok(());
    }
    for (field, label) in Field::ALL.iter().zip(header.iter()) {
        let label = label.trim().trim_start_matches('\u{feff}');
        if !label.eq_ignore_ascii_case(field.header()) {
            return Err(OrgTreeError::SchemaMismatch {
                row: 0,
                detail: format!(
                    "column {} is `{}`, expected `{}`",
                    field.index(),
                    label,
                    field.header()
                ),
            });
        }
    }
    Ok(())
}

/// Streams validated rows out of a CSV source, in file order.
pub struct RowReader<R: Read> {
    reader: csv::Reader<R>,
    next_row: usize,
}

impl RowReader<File> {
    pub fn open(path: &Path, strict_headers: bool) -> Result<Self> {
        if !path.is_file() {
            return Err(OrgTreeError::InputNotFound {
                path: path.to_path_buf(),
            });
        }
        let file = File::open(path)?;
        RowReader::from_reader(file, strict_headers)
    }
}

impl<R: Read> RowReader<R> {
    pub fn from_reader(source: R, strict_headers: bool) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(source);
        let header = reader
            .headers()
            .map_err(|source| OrgTreeError::Csv { row: 0, source })?
            .clone();
        check_header(&header, strict_headers)?;
        Ok(RowReader {
            reader,
            next_row: 1,
        })
    }
}

impl<R: Read> Iterator for RowReader<R> {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut record = StringRecord::new();
        let number = self.next_row;
        match self.reader.read_record(&mut record) {
            Ok(false) => None,
            Ok(true) => {
                self.next_row += 1;
                let row = Row::new(number, record);
                Some(row.check_layout().map(|_| row))
            }
            Err(source) => {
                self.next_row += 1;
                Some(Err(OrgTreeError::Csv { row: number, source }))
            }
        }
    }
}
