use rusqlite::types::Type;
use rusqlite::{
    params, Connection, OptionalExtension, Result as SqlResult, Row, TransactionBehavior,
};
use rust_decimal::Decimal;
use std::path::PathBuf;
use std::str::FromStr;

use crate::models::{
    CaseFile, CaseFileOverview, Client, ClientPayload, Direction, InvoiceDocument, InvoiceRecord,
    Payment,
};
use crate::services::error::ServiceError;
use crate::services::numbering::next_invoice_number;
use crate::utils::now_rfc3339;

const CASE_FILE_FIELDS: [&str; 26] = [
    "dossier_no",
    "mode",
    "expediteur",
    "destinataire",
    "marchandise",
    "nature_chargement",
    "agent_marit",
    "magasin",
    "port_emb",
    "date_emb",
    "port_dest",
    "date_dest",
    "ctu_lta",
    "navire",
    "escale",
    "rubrique",
    "colisage",
    "pb",
    "valeur_devise",
    "valeur_dinars",
    "dg",
    "type_declaration",
    "declaration_no",
    "date_declaration",
    "repertoire",
    "banque",
];

/// Number of columns `case_file_from_row` consumes.
const CASE_FILE_WIDTH: usize = CASE_FILE_FIELDS.len() + 2;

fn case_file_columns(prefix: &str) -> String {
    CASE_FILE_FIELDS
        .iter()
        .chain(["created_at", "updated_at"].iter())
        .map(|field| format!("{}{}", prefix, field))
        .collect::<Vec<_>>()
        .join(", ")
}

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn new(db_path: PathBuf) -> SqlResult<Self> {
        Self::from_connection(Connection::open(db_path)?)
    }

    pub fn open_in_memory() -> SqlResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> SqlResult<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        let mut db = Database { conn };
        db.run_migrations()?;
        Ok(db)
    }

    fn run_migrations(&mut self) -> SqlResult<()> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS schema_migrations (
                name TEXT PRIMARY KEY,
                applied_at TEXT NOT NULL
            );",
        )?;

        let migrations = vec![
            (
                "001_create_dossiers_and_clients.sql",
                include_str!(concat!(
                    env!("CARGO_MANIFEST_DIR"),
                    "/migrations/001_create_dossiers_and_clients.sql"
                )),
            ),
            (
                "002_create_factures_and_paiements.sql",
                include_str!(concat!(
                    env!("CARGO_MANIFEST_DIR"),
                    "/migrations/002_create_factures_and_paiements.sql"
                )),
            ),
            (
                "003_create_settings.sql",
                include_str!(concat!(
                    env!("CARGO_MANIFEST_DIR"),
                    "/migrations/003_create_settings.sql"
                )),
            ),
        ];

        for (name, sql) in migrations {
            let applied: Option<String> = self
                .conn
                .query_row(
                    "SELECT name FROM schema_migrations WHERE name = ?1",
                    params![name],
                    |row| row.get(0),
                )
                .optional()?;

            if applied.is_none() {
                let tx = self.conn.transaction()?;
                tx.execute_batch(sql)?;
                tx.execute(
                    "INSERT INTO schema_migrations (name, applied_at) VALUES (?1, datetime('now'))",
                    params![name],
                )?;
                tx.commit()?;
                tracing::debug!(migration = name, "Applied migration");
            }
        }

        Ok(())
    }

    // ----- case files -----

    pub fn insert_case_file(&self, case_file: &CaseFile) -> SqlResult<CaseFile> {
        let now = now_rfc3339();
        let created_at = case_file.created_at.clone().unwrap_or_else(|| now.clone());
        let c = case_file;
        self.conn.execute(
            &format!(
                "INSERT INTO dossiers ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14,
                 ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25, ?26, ?27, ?28)",
                case_file_columns("")
            ),
            params![
                c.case_number.trim(),
                c.direction.as_str(),
                c.sender,
                c.recipient,
                c.goods,
                c.load_type,
                c.shipping_agent,
                c.warehouse,
                c.loading_port,
                c.loading_date,
                c.destination_port,
                c.arrival_date,
                c.container_ref,
                c.vessel,
                c.port_call,
                c.heading,
                c.packaging,
                c.gross_weight,
                c.foreign_value,
                c.customs_value,
                c.dg,
                c.declaration_type,
                c.declaration_number,
                c.declaration_date,
                c.register,
                c.bank,
                created_at,
                now
            ],
        )?;

        self.get_case_file(case_file.case_number.trim())?
            .ok_or(rusqlite::Error::QueryReturnedNoRows)
    }

    pub fn get_case_file(&self, case_number: &str) -> SqlResult<Option<CaseFile>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM dossiers WHERE dossier_no = ?1",
            case_file_columns("")
        ))?;
        stmt.query_row(params![case_number], |row| case_file_from_row(row, 0))
            .optional()
    }

    pub fn list_case_files(&self) -> SqlResult<Vec<CaseFile>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM dossiers ORDER BY created_at DESC",
            case_file_columns("")
        ))?;
        let rows = stmt.query_map([], |row| case_file_from_row(row, 0))?;
        rows.collect()
    }

    /// Rewrites every field except the case number. Returns the number of
    /// updated rows.
    pub fn update_case_file(&self, case_number: &str, case_file: &CaseFile) -> SqlResult<usize> {
        let c = case_file;
        self.conn.execute(
            "UPDATE dossiers SET
                mode = ?2, expediteur = ?3, destinataire = ?4, marchandise = ?5,
                nature_chargement = ?6, agent_marit = ?7, magasin = ?8, port_emb = ?9,
                date_emb = ?10, port_dest = ?11, date_dest = ?12, ctu_lta = ?13, navire = ?14,
                escale = ?15, rubrique = ?16, colisage = ?17, pb = ?18, valeur_devise = ?19,
                valeur_dinars = ?20, dg = ?21, type_declaration = ?22, declaration_no = ?23,
                date_declaration = ?24, repertoire = ?25, banque = ?26, updated_at = ?27
             WHERE dossier_no = ?1",
            params![
                case_number,
                c.direction.as_str(),
                c.sender,
                c.recipient,
                c.goods,
                c.load_type,
                c.shipping_agent,
                c.warehouse,
                c.loading_port,
                c.loading_date,
                c.destination_port,
                c.arrival_date,
                c.container_ref,
                c.vessel,
                c.port_call,
                c.heading,
                c.packaging,
                c.gross_weight,
                c.foreign_value,
                c.customs_value,
                c.dg,
                c.declaration_type,
                c.declaration_number,
                c.declaration_date,
                c.register,
                c.bank,
                now_rfc3339()
            ],
        )
    }

    /// Deletes the payment row and the case file in one transaction. Invoices
    /// go with the case file through the foreign key.
    pub fn delete_case_file(&mut self, case_number: &str) -> SqlResult<bool> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "DELETE FROM paiements WHERE dossier_no = ?1",
            params![case_number],
        )?;
        let deleted = tx.execute(
            "DELETE FROM dossiers WHERE dossier_no = ?1",
            params![case_number],
        )?;
        tx.commit()?;
        Ok(deleted > 0)
    }

    /// Case files joined with their first invoice and their payment row,
    /// newest first.
    pub fn list_case_file_overviews(&self) -> SqlResult<Vec<CaseFileOverview>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {}, f.id, f.numero, f.montant_total,
                    p.id, p.dossier_no, p.paye, p.montant, p.date_creation, p.date_maj
             FROM dossiers d
             LEFT JOIN factures f
                ON f.id = (SELECT MIN(id) FROM factures WHERE dossier_no = d.dossier_no)
             LEFT JOIN paiements p ON p.dossier_no = d.dossier_no
             ORDER BY d.created_at DESC",
            case_file_columns("d.")
        ))?;

        let rows = stmt.query_map([], |row| {
            let case_file = case_file_from_row(row, 0)?;
            let base = CASE_FILE_WIDTH;
            let invoice_id: Option<i64> = row.get(base)?;
            let invoice_number: Option<String> = row.get(base + 1)?;
            let invoice_amount = match row.get::<_, Option<String>>(base + 2)? {
                Some(raw) => decimal_from_sql(base + 2, &raw)?,
                None => Decimal::ZERO,
            };
            let payment = match row.get::<_, Option<String>>(base + 3)? {
                Some(_) => Some(payment_from_row(row, base + 3)?),
                None => None,
            };
            Ok(CaseFileOverview {
                case_file,
                has_invoice: invoice_id.is_some(),
                invoice_id,
                invoice_number,
                invoice_amount,
                payment,
            })
        })?;

        rows.collect()
    }

    // ----- clients -----

    pub fn insert_client(&self, payload: &ClientPayload) -> SqlResult<Client> {
        let client = Client {
            id: uuid::Uuid::new_v4().to_string(),
            code: payload.code.trim().to_string(),
            name: payload.name.trim().to_string(),
            address: payload.address.trim().to_string(),
            vat_code: payload.vat_code.trim().to_string(),
            created_at: now_rfc3339(),
        };
        self.conn.execute(
            "INSERT INTO clients (id, code_client, nom_client, adresse, code_tva, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                client.id,
                client.code,
                client.name,
                client.address,
                client.vat_code,
                client.created_at
            ],
        )?;
        Ok(client)
    }

    pub fn list_clients(&self) -> SqlResult<Vec<Client>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, code_client, nom_client, adresse, code_tva, created_at
             FROM clients
             ORDER BY created_at DESC, rowid DESC",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(Client {
                id: row.get(0)?,
                code: row.get(1)?,
                name: row.get(2)?,
                address: row.get(3)?,
                vat_code: row.get(4)?,
                created_at: row.get(5)?,
            })
        })?;

        rows.collect()
    }

    pub fn delete_client(&self, id: &str) -> SqlResult<bool> {
        let deleted = self
            .conn
            .execute("DELETE FROM clients WHERE id = ?1", params![id])?;
        Ok(deleted > 0)
    }

    // ----- payments -----

    pub fn get_payment(&self, case_number: &str) -> SqlResult<Option<Payment>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, dossier_no, paye, montant, date_creation, date_maj
             FROM paiements WHERE dossier_no = ?1",
        )?;
        stmt.query_row(params![case_number], |row| payment_from_row(row, 0))
            .optional()
    }

    pub fn count_payments(&self, case_number: &str) -> SqlResult<i64> {
        self.conn.query_row(
            "SELECT COUNT(*) FROM paiements WHERE dossier_no = ?1",
            params![case_number],
            |row| row.get(0),
        )
    }

    /// Flips the paid flag in a single upsert; a missing row becomes a paid
    /// row. Returns the new flag.
    pub fn toggle_payment(&self, case_number: &str) -> SqlResult<bool> {
        let now = now_rfc3339();
        self.conn.query_row(
            "INSERT INTO paiements (id, dossier_no, paye, montant, date_creation, date_maj)
             VALUES (?1, ?2, 1, NULL, ?3, ?3)
             ON CONFLICT(dossier_no) DO UPDATE SET
                paye = NOT paiements.paye,
                date_maj = excluded.date_maj
             RETURNING paye",
            params![uuid::Uuid::new_v4().to_string(), case_number, now],
            |row| row.get(0),
        )
    }

    pub fn set_payment_status(&self, case_number: &str, paid: bool) -> SqlResult<()> {
        let now = now_rfc3339();
        self.conn.execute(
            "INSERT INTO paiements (id, dossier_no, paye, montant, date_creation, date_maj)
             VALUES (?1, ?2, ?3, NULL, ?4, ?4)
             ON CONFLICT(dossier_no) DO UPDATE SET
                paye = excluded.paye,
                date_maj = excluded.date_maj",
            params![uuid::Uuid::new_v4().to_string(), case_number, paid, now],
        )?;
        Ok(())
    }

    /// Stores the invoiced amount. A new row starts unpaid; an existing row
    /// keeps its paid flag.
    pub fn record_payment_amount(&self, case_number: &str, amount: Decimal) -> SqlResult<()> {
        let now = now_rfc3339();
        self.conn.execute(
            "INSERT INTO paiements (id, dossier_no, paye, montant, date_creation, date_maj)
             VALUES (?1, ?2, 0, ?3, ?4, ?4)
             ON CONFLICT(dossier_no) DO UPDATE SET
                montant = excluded.montant,
                date_maj = excluded.date_maj",
            params![
                uuid::Uuid::new_v4().to_string(),
                case_number,
                amount.to_string(),
                now
            ],
        )?;
        Ok(())
    }

    // ----- invoices -----

    pub fn invoice_numbers_newest_first(&self) -> SqlResult<Vec<String>> {
        invoice_numbers_newest_first(&self.conn)
    }

    /// The invoice a case file is billed with: its oldest one.
    pub fn get_invoice_for_case(&self, case_number: &str) -> SqlResult<Option<InvoiceRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, dossier_no, numero, montant_total, data_json, created_at, updated_at
             FROM factures WHERE dossier_no = ?1
             ORDER BY id ASC LIMIT 1",
        )?;
        stmt.query_row(params![case_number], invoice_from_row)
            .optional()
    }

    /// Allocates the next number for `year` and inserts the invoice built
    /// for it, inside one write-locked transaction.
    pub fn insert_invoice_with_next_number<F>(
        &mut self,
        case_number: &str,
        year: u8,
        build: F,
    ) -> Result<InvoiceRecord, ServiceError>
    where
        F: FnOnce(&str) -> InvoiceDocument,
    {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let numbers = invoice_numbers_newest_first(&tx)?;
        let number = next_invoice_number(numbers.iter().map(String::as_str), year)?.to_string();
        let document = build(&number);
        let grand_total = document.totals.grand_total;
        let now = now_rfc3339();

        tx.execute(
            "INSERT INTO factures (dossier_no, numero, montant_total, data_json, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
            params![
                case_number,
                number,
                grand_total.to_string(),
                document_to_sql(&document)?,
                now
            ],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;

        Ok(InvoiceRecord {
            id,
            case_number: case_number.to_string(),
            number,
            grand_total,
            document,
            created_at: now.clone(),
            updated_at: now,
        })
    }

    pub fn update_invoice(&self, id: i64, document: &InvoiceDocument) -> SqlResult<usize> {
        self.conn.execute(
            "UPDATE factures SET montant_total = ?2, data_json = ?3, updated_at = ?4 WHERE id = ?1",
            params![
                id,
                document.totals.grand_total.to_string(),
                document_to_sql(document)?,
                now_rfc3339()
            ],
        )
    }

    pub fn invoiced_total(&self) -> SqlResult<Decimal> {
        let mut stmt = self.conn.prepare("SELECT montant_total FROM factures")?;
        let amounts = stmt.query_map([], |row| {
            let raw: String = row.get(0)?;
            decimal_from_sql(0, &raw)
        })?;
        amounts.sum()
    }

    // ----- settings -----

    pub fn set_setting(&self, key: &str, value: &str) -> SqlResult<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO settings (key, value, updated_at) VALUES (?1, ?2, datetime('now'))",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn get_setting(&self, key: &str) -> SqlResult<Option<String>> {
        let mut stmt = self.conn.prepare("SELECT value FROM settings WHERE key = ?1")?;
        stmt.query_row(params![key], |row| row.get(0)).optional()
    }
}

fn invoice_numbers_newest_first(conn: &Connection) -> SqlResult<Vec<String>> {
    let mut stmt = conn.prepare("SELECT numero FROM factures ORDER BY created_at DESC, id DESC")?;
    let rows = stmt.query_map([], |row| row.get(0))?;
    rows.collect()
}

fn case_file_from_row(row: &Row<'_>, offset: usize) -> SqlResult<CaseFile> {
    let mode: String = row.get(offset + 1)?;
    let direction = Direction::from_str(&mode)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(offset + 1, Type::Text, e.into()))?;

    Ok(CaseFile {
        case_number: row.get(offset)?,
        direction,
        sender: row.get(offset + 2)?,
        recipient: row.get(offset + 3)?,
        goods: row.get(offset + 4)?,
        load_type: row.get(offset + 5)?,
        shipping_agent: row.get(offset + 6)?,
        warehouse: row.get(offset + 7)?,
        loading_port: row.get(offset + 8)?,
        loading_date: row.get(offset + 9)?,
        destination_port: row.get(offset + 10)?,
        arrival_date: row.get(offset + 11)?,
        container_ref: row.get(offset + 12)?,
        vessel: row.get(offset + 13)?,
        port_call: row.get(offset + 14)?,
        heading: row.get(offset + 15)?,
        packaging: row.get(offset + 16)?,
        gross_weight: row.get(offset + 17)?,
        foreign_value: row.get(offset + 18)?,
        customs_value: row.get(offset + 19)?,
        dg: row.get(offset + 20)?,
        declaration_type: row.get(offset + 21)?,
        declaration_number: row.get(offset + 22)?,
        declaration_date: row.get(offset + 23)?,
        register: row.get(offset + 24)?,
        bank: row.get(offset + 25)?,
        created_at: row.get(offset + 26)?,
        updated_at: row.get(offset + 27)?,
    })
}

fn payment_from_row(row: &Row<'_>, offset: usize) -> SqlResult<Payment> {
    let amount = match row.get::<_, Option<String>>(offset + 3)? {
        Some(raw) => Some(decimal_from_sql(offset + 3, &raw)?),
        None => None,
    };
    Ok(Payment {
        id: row.get(offset)?,
        case_number: row.get(offset + 1)?,
        paid: row.get(offset + 2)?,
        amount,
        created_at: row.get(offset + 4)?,
        updated_at: row.get(offset + 5)?,
    })
}

fn invoice_from_row(row: &Row<'_>) -> SqlResult<InvoiceRecord> {
    let raw_total: String = row.get(3)?;
    let raw_document: String = row.get(4)?;
    let document = serde_json::from_str(&raw_document)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, Type::Text, Box::new(e)))?;

    Ok(InvoiceRecord {
        id: row.get(0)?,
        case_number: row.get(1)?,
        number: row.get(2)?,
        grand_total: decimal_from_sql(3, &raw_total)?,
        document,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

fn decimal_from_sql(index: usize, raw: &str) -> SqlResult<Decimal> {
    Decimal::from_str(raw.trim())
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(e)))
}

fn document_to_sql(document: &InvoiceDocument) -> SqlResult<String> {
    serde_json::to_string(document).map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))
}
