// src/services/consumption_service.rs

//! Carga massiva de consumos a partir de CSV ou planilha.
//!
//! O arquivo é validado por inteiro antes de qualquer escrita: se uma linha
//! tiver erro, nada é gravado e a resposta lista todos os problemas encontrados.

use std::collections::{HashMap, HashSet};
use std::io::Cursor;
use std::str::FromStr;

use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};
use csv::{ReaderBuilder, Trim};
use rust_decimal::Decimal;
use sqlx::PgPool;
use validator::{ValidationError, ValidationErrors};

use crate::{
    common::{
        db_utils::unique_violation,
        error::{AppError, RowError},
    },
    db::{consumption_repo::BULK_SOURCE, BuildingRepository, ConsumptionRepository},
    models::{
        consumption::{ConsumptionRow, ImportSummary},
        rbac::Permission,
    },
    services::authz_service::AuthorizationService,
};

const COL_BUILDING: &str = "id_edificio";
const COL_YEAR: &str = "anio";
const COL_MONTH: &str = "mes";
const COL_KWH: &str = "consumo_kwh";
const COL_COST: &str = "costo_total";

pub const REQUIRED_COLUMNS: [&str; 5] = [COL_BUILDING, COL_YEAR, COL_MONTH, COL_KWH, COL_COST];

const SPREADSHEET_EXTENSIONS: [&str; 4] = [".xlsx", ".xlsm", ".xls", ".ods"];

type RecordKey = (i64, i32, i32);

/// Conteúdo tabular do arquivo, antes de qualquer validação.
/// Cada linha leva o número que tem no arquivo (o cabeçalho é a linha 1).
#[derive(Debug, Default)]
pub struct RawTable {
    pub header: Vec<String>,
    pub rows: Vec<(usize, Vec<String>)>,
}

fn row_error(row: usize, column: &str, error: impl Into<String>, value: &str) -> RowError {
    RowError {
        row,
        column: column.to_string(),
        error: error.into(),
        value: value.to_string(),
    }
}

fn malformed_line(e: &csv::Error) -> RowError {
    let line = e.position().map_or(1, |p| usize::try_from(p.line()).unwrap_or(usize::MAX));
    row_error(line, "", "Linha CSV malformada.", &e.to_string())
}

/// Lê um CSV separado por vírgulas; campos entre aspas podem conter vírgulas.
pub fn read_csv(content: &str) -> Result<RawTable, Vec<RowError>> {
    let content = content.trim_start_matches('\u{feff}');
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .flexible(true)
        .from_reader(content.as_bytes());

    let header = reader
        .headers()
        .map_err(|e| vec![malformed_line(&e)])?
        .iter()
        .map(str::to_string)
        .collect();

    let mut table = RawTable { header, rows: Vec::new() };
    let mut errors = Vec::new();
    for result in reader.records() {
        match result {
            Ok(record) => {
                let line = record.position().map_or(0, |p| usize::try_from(p.line()).unwrap_or(usize::MAX));
                table.rows.push((line, record.iter().map(str::to_string).collect()));
            }
            Err(e) => errors.push(malformed_line(&e)),
        }
    }

    if errors.is_empty() {
        Ok(table)
    } else {
        Err(errors)
    }
}

/// Converte o intervalo usado de uma aba em tabela; a primeira linha é o cabeçalho.
pub fn table_from_range(range: &Range<Data>) -> RawTable {
    // Linhas vazias acima do intervalo continuam contando na numeração
    let first_row = range.start().map_or(0, |(row, _)| row as usize);

    let mut rows = range.rows().enumerate().map(|(i, cells)| {
        let values = cells.iter().map(|cell| cell.to_string().trim().to_string()).collect();
        (first_row + i + 1, values)
    });

    let header = rows.next().map(|(_, values)| values).unwrap_or_default();
    RawTable { header, rows: rows.collect() }
}

/// Lê a primeira aba de uma planilha (xlsx, xls, ods).
pub fn read_spreadsheet(bytes: &[u8]) -> Result<RawTable, AppError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|_| file_error("invalid_spreadsheet", "Não foi possível abrir a planilha."))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| file_error("invalid_spreadsheet", "A planilha não possui abas."))?
        .map_err(|_| file_error("invalid_spreadsheet", "Não foi possível ler a primeira aba da planilha."))?;

    Ok(table_from_range(&range))
}

pub fn is_spreadsheet(file_name: &str) -> bool {
    let lower = file_name.to_lowercase();
    SPREADSHEET_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

fn field_at<'a>(fields: &'a [String], index: &HashMap<&str, usize>, column: &str) -> &'a str {
    index
        .get(column)
        .and_then(|&i| fields.get(i))
        .map_or("", String::as_str)
}

/// Valida a tabela lida. A ordem das colunas é livre e o cabeçalho ignora maiúsculas.
pub fn validate_table(table: RawTable) -> Result<Vec<ConsumptionRow>, Vec<RowError>> {
    if table.header.iter().all(|name| name.is_empty()) {
        return Err(vec![row_error(1, "", "O arquivo está vazio.", "")]);
    }

    let names: Vec<String> = table.header.iter().map(|f| f.to_lowercase()).collect();
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut errors = Vec::new();
    for column in REQUIRED_COLUMNS {
        match names.iter().position(|n| n == column) {
            Some(i) => {
                index.insert(column, i);
            }
            None => errors.push(row_error(1, column, "Coluna obrigatória ausente.", "")),
        }
    }
    if !errors.is_empty() {
        return Err(errors);
    }

    let mut rows = Vec::new();
    let mut first_seen: HashMap<RecordKey, usize> = HashMap::new();

    for (row, fields) in &table.rows {
        let row = *row;
        if fields.iter().all(|f| f.is_empty()) {
            continue;
        }

        let field = |column: &str| field_at(fields, &index, column);
        let before = errors.len();

        let building_raw = field(COL_BUILDING);
        let building_id = building_raw.parse::<i64>().ok();
        if building_id.is_none() {
            errors.push(row_error(row, COL_BUILDING, "O ID do edifício deve ser um número inteiro.", building_raw));
        }

        let year_raw = field(COL_YEAR);
        let year = year_raw.parse::<i32>().ok().filter(|y| (2000..=2050).contains(y));
        if year.is_none() {
            errors.push(row_error(row, COL_YEAR, "O ano deve estar entre 2000 e 2050.", year_raw));
        }

        let month_raw = field(COL_MONTH);
        let month = month_raw.parse::<i32>().ok().filter(|m| (1..=12).contains(m));
        if month.is_none() {
            errors.push(row_error(row, COL_MONTH, "O mês deve estar entre 1 e 12.", month_raw));
        }

        let kwh_raw = field(COL_KWH);
        let kwh = Decimal::from_str(kwh_raw).ok().filter(|v| !v.is_sign_negative());
        if kwh.is_none() {
            errors.push(row_error(row, COL_KWH, "O consumo deve ser um número não negativo.", kwh_raw));
        }

        let cost_raw = field(COL_COST);
        let cost = Decimal::from_str(cost_raw).ok().filter(|v| !v.is_sign_negative());
        if cost.is_none() {
            errors.push(row_error(row, COL_COST, "O custo deve ser um número não negativo.", cost_raw));
        }

        if errors.len() > before {
            continue;
        }

        if let (Some(building_id), Some(year), Some(month), Some(consumption_kwh), Some(total_cost)) =
            (building_id, year, month, kwh, cost)
        {
            let key = (building_id, year, month);
            if let Some(first) = first_seen.get(&key) {
                errors.push(row_error(
                    row,
                    COL_MONTH,
                    format!("Registro duplicado no arquivo (já informado na linha {first})."),
                    month_raw,
                ));
                continue;
            }
            first_seen.insert(key, row);

            rows.push(ConsumptionRow {
                line: row,
                building_id,
                year,
                month,
                consumption_kwh,
                total_cost,
            });
        }
    }

    if !errors.is_empty() {
        return Err(errors);
    }
    if rows.is_empty() {
        return Err(vec![row_error(1, "", "O arquivo não possui linhas de dados.", "")]);
    }
    Ok(rows)
}

/// Lê e valida um CSV.
pub fn parse_consumption_csv(content: &str) -> Result<Vec<ConsumptionRow>, Vec<RowError>> {
    read_csv(content).and_then(validate_table)
}

/// Confere as linhas contra o que já existe: edifício cadastrado e mês ainda sem registro.
pub fn check_against_storage(
    rows: &[ConsumptionRow],
    known_buildings: &HashSet<i64>,
    stored: &HashSet<RecordKey>,
) -> Vec<RowError> {
    let mut errors = Vec::new();
    for row in rows {
        if !known_buildings.contains(&row.building_id) {
            errors.push(row_error(
                row.line,
                COL_BUILDING,
                "Edifício não encontrado.",
                &row.building_id.to_string(),
            ));
        } else if stored.contains(&(row.building_id, row.year, row.month)) {
            errors.push(row_error(
                row.line,
                COL_MONTH,
                format!("Já existe registro para o edifício em {}/{}.", row.month, row.year),
                &row.month.to_string(),
            ));
        }
    }
    errors
}

pub(crate) fn file_error(code: &'static str, message: &'static str) -> AppError {
    let mut error = ValidationError::new(code);
    error.message = Some(message.into());
    let mut errors = ValidationErrors::new();
    errors.add("file", error);
    AppError::ValidationError(errors)
}

#[derive(Clone)]
pub struct ConsumptionService {
    consumption_repo: ConsumptionRepository,
    building_repo: BuildingRepository,
    authz: AuthorizationService,
    pool: PgPool,
}

impl ConsumptionService {
    pub fn new(
        consumption_repo: ConsumptionRepository,
        building_repo: BuildingRepository,
        authz: AuthorizationService,
        pool: PgPool,
    ) -> Self {
        Self { consumption_repo, building_repo, authz, pool }
    }

    // A checagem é grossa: basta poder carregar em alguma dependência.
    // As linhas não são conferidas contra as dependências do usuário.
    pub async fn import(
        &self,
        actor_id: i64,
        file_name: Option<&str>,
        bytes: &[u8],
    ) -> Result<ImportSummary, AppError> {
        self.authz.ensure_anywhere(actor_id, Permission::UploadConsumption).await?;

        let table = if is_spreadsheet(file_name.unwrap_or_default()) {
            read_spreadsheet(bytes)?
        } else {
            let content = std::str::from_utf8(bytes)
                .map_err(|_| file_error("invalid_encoding", "O arquivo deve estar em UTF-8."))?;
            read_csv(content).map_err(AppError::ImportRejected)?
        };

        let rows = validate_table(table).map_err(AppError::ImportRejected)?;

        let mut tx = self.pool.begin().await?;

        let building_ids: Vec<i64> = rows
            .iter()
            .map(|r| r.building_id)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        let known: HashSet<i64> = self.building_repo
            .existing_ids(&mut *tx, &building_ids)
            .await?
            .into_iter()
            .collect();
        let stored: HashSet<RecordKey> = self.consumption_repo
            .existing_keys(&mut *tx, &building_ids)
            .await?
            .into_iter()
            .collect();

        let errors = check_against_storage(&rows, &known, &stored);
        if !errors.is_empty() {
            tracing::info!(actor_id, errors = errors.len(), "Carga de consumos rejeitada");
            return Err(AppError::ImportRejected(errors));
        }

        let inserted = self.consumption_repo
            .insert_rows(&mut *tx, &rows, BULK_SOURCE)
            .await
            .map_err(|e| match e {
                AppError::DatabaseError(db_err) if unique_violation(&db_err).is_some() => {
                    AppError::Conflict("Registros de consumo gravados em paralelo; tente novamente.".into())
                }
                other => other,
            })?;

        tx.commit().await?;

        tracing::info!(actor_id, inserted, "Carga de consumos concluída");
        Ok(ImportSummary { inserted })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "id_edificio,anio,mes,consumo_kwh,costo_total";

    #[test]
    fn parses_a_valid_file() {
        let csv = format!("{HEADER}\n10,2025,1,1500.5,3200.75\n11,2025,1,0,0\n");
        let rows = parse_consumption_csv(&csv).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].line, 2);
        assert_eq!(rows[0].building_id, 10);
        assert_eq!(rows[0].consumption_kwh, Decimal::from_str("1500.5").unwrap());
        assert_eq!(rows[1].total_cost, Decimal::ZERO);
    }

    #[test]
    fn header_is_case_insensitive_and_order_free() {
        let csv = "MES,Costo_Total,ID_EDIFICIO,anio,consumo_kwh\n3,100,7,2024,50\n";
        let rows = parse_consumption_csv(csv).unwrap();

        assert_eq!(rows[0].building_id, 7);
        assert_eq!(rows[0].month, 3);
        assert_eq!(rows[0].year, 2024);
    }

    #[test]
    fn reports_missing_columns_on_the_header_row() {
        let errors = parse_consumption_csv("id_edificio,anio,mes\n1,2025,1\n").unwrap_err();
        let columns: Vec<&str> = errors.iter().map(|e| e.column.as_str()).collect();

        assert_eq!(columns, vec!["consumo_kwh", "costo_total"]);
        assert!(errors.iter().all(|e| e.row == 1));
    }

    #[test]
    fn collects_every_row_error() {
        let csv = format!("{HEADER}\nabc,2025,1,10,10\n1,1999,13,-5,10\n2,2025,2,10,10\n");
        let errors = parse_consumption_csv(&csv).unwrap_err();

        let found: Vec<(usize, &str)> = errors.iter().map(|e| (e.row, e.column.as_str())).collect();
        assert_eq!(
            found,
            vec![
                (2, "id_edificio"),
                (3, "anio"),
                (3, "mes"),
                (3, "consumo_kwh"),
            ]
        );
        assert_eq!(errors[1].value, "1999");
    }

    #[test]
    fn duplicated_month_in_the_same_file_is_rejected() {
        let csv = format!("{HEADER}\n5,2025,6,10,10\n5,2025,6,20,20\n");
        let errors = parse_consumption_csv(&csv).unwrap_err();

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].row, 3);
        assert!(errors[0].error.contains("linha 2"));
    }

    #[test]
    fn header_only_file_has_no_data() {
        let errors = parse_consumption_csv(&format!("{HEADER}\n\n")).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].row, 1);
    }

    #[test]
    fn quoted_fields_may_contain_commas() {
        let csv = "observaciones,id_edificio,anio,mes,consumo_kwh,costo_total\n\
                   \"Planta A, piso 2\",10,2025,1,1500,3200\n";
        let rows = parse_consumption_csv(csv).unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].building_id, 10);
        assert_eq!(rows[0].year, 2025);
        assert_eq!(rows[0].total_cost, Decimal::from(3200));
    }

    #[test]
    fn rows_keep_their_file_line_numbers() {
        let csv = format!("{}{HEADER}\n\n1,2025,1,10,10\n  ,  , , ,\n2,2025,1,x,10\n", '\u{feff}');
        let errors = parse_consumption_csv(&csv).unwrap_err();

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].row, 5);
        assert_eq!(errors[0].column, "consumo_kwh");
    }

    fn sheet(cells: &[&[Data]]) -> Range<Data> {
        let rows = cells.len() as u32;
        let cols = cells[0].len() as u32;
        let mut range = Range::new((0, 0), (rows - 1, cols - 1));
        for (r, row) in cells.iter().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                range.set_value((r as u32, c as u32), cell.clone());
            }
        }
        range
    }

    #[test]
    fn spreadsheet_cells_go_through_the_same_validation() {
        let text = |s: &str| Data::String(s.to_string());
        let range = sheet(&[
            &[text("ID_EDIFICIO"), text("anio"), text("mes"), text("consumo_kwh"), text("costo_total")],
            &[Data::Float(10.0), Data::Float(2025.0), Data::Int(3), Data::Float(1500.5), Data::Float(3200.0)],
            &[Data::Float(11.0), Data::Float(2025.0), Data::Int(3), Data::Empty, Data::Float(10.0)],
        ]);

        let table = table_from_range(&range);
        assert_eq!(table.rows[0].0, 2);

        let errors = validate_table(table).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!((errors[0].row, errors[0].column.as_str()), (3, "consumo_kwh"));
    }

    #[test]
    fn spreadsheet_numbers_are_read_as_plain_values() {
        let text = |s: &str| Data::String(s.to_string());
        let range = sheet(&[
            &[text("id_edificio"), text("anio"), text("mes"), text("consumo_kwh"), text("costo_total")],
            &[Data::Float(7.0), Data::Float(2024.0), Data::Float(12.0), Data::Float(0.0), Data::Float(99.25)],
        ]);

        let rows = validate_table(table_from_range(&range)).unwrap();
        assert_eq!(rows[0].building_id, 7);
        assert_eq!(rows[0].month, 12);
        assert_eq!(rows[0].total_cost, Decimal::from_str("99.25").unwrap());
    }

    #[test]
    fn unreadable_spreadsheet_is_a_file_error() {
        assert!(is_spreadsheet("Consumos_2025.XLSX"));
        assert!(!is_spreadsheet("consumos.csv"));

        let err = read_spreadsheet(b"id_edificio,anio\n1,2025\n").unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[test]
    fn storage_check_flags_unknown_buildings_and_existing_months() {
        let csv = format!("{HEADER}\n1,2025,1,10,10\n2,2025,1,10,10\n3,2025,2,10,10\n");
        let rows = parse_consumption_csv(&csv).unwrap();

        let known: HashSet<i64> = [1, 3].into_iter().collect();
        let stored: HashSet<RecordKey> = [(3, 2025, 2)].into_iter().collect();

        let errors = check_against_storage(&rows, &known, &stored);
        let found: Vec<(usize, &str)> = errors.iter().map(|e| (e.row, e.column.as_str())).collect();
        assert_eq!(found, vec![(3, "id_edificio"), (4, "mes")]);
    }
}
