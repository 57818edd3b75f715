//! SQLite-backed payment repository.
//!
//! # Responsibility
//! - Map the nested payment document onto the flat `payments` table and back.
//! - Translate SQLite failures into repository error kinds at one seam
//!   (`classify_sqlite_error` / `classify_rows_affected`).
//!
//! # Invariants
//! - Every leaf field maps to exactly one column or one composite field.
//! - Optional groups (`charges_info_*`, `fx_*`) are all-NULL when absent.
//! - Each call issues one statement, except `list` (count, then select)
//!   which runs without a surrounding transaction.

use crate::db::composite::MoneyArray;
use crate::db::migrations::{current_user_version, latest_version};
use crate::model::payment::{
    ChargesInformation, Money, Payment, PaymentAttributes, PaymentFx, PaymentId, PaymentParty,
    SponsorParty, PAYMENT_RESOURCE_TYPE,
};
use crate::repo::payment_repo::{
    check_list_bounds, check_offset_in_range, conflict, not_found, updated_record,
    PaymentRepository, RepoError, RepoResult,
};
use once_cell::sync::Lazy;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ValueRef};
use rusqlite::{ffi, params, Connection, ErrorCode, Row, ToSql};
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

const PAYMENTS_TABLE: &str = "payments";

/// Column order shared by every generated statement. `id` must stay first.
const PAYMENT_COLUMNS: &[&str] = &[
    "id",
    "organisation",
    "version",
    "amount",
    "currency",
    "beneficiary_party_name",
    "beneficiary_party_number",
    "beneficiary_party_number_code",
    "beneficiary_party_type",
    "beneficiary_party_address",
    "beneficiary_party_bank_id",
    "beneficiary_party_bank_id_code",
    "beneficiary_party_client_name",
    "charges_info_bearer_code",
    "charges_info_receiver_charges",
    "charges_info_sender_charges",
    "debtor_party_name",
    "debtor_party_number",
    "debtor_party_number_code",
    "debtor_party_type",
    "debtor_party_address",
    "debtor_party_bank_id",
    "debtor_party_bank_id_code",
    "debtor_party_client_name",
    "e2e_reference",
    "fx_contract_ref",
    "fx_rate",
    "fx_original_amount",
    "numeric_reference",
    "payment_id",
    "payment_type",
    "processing_date",
    "purpose",
    "reference",
    "scheme",
    "scheme_payment_subtype",
    "scheme_payment_type",
    "sponsor_party_account_number",
    "sponsor_party_bank_id",
    "sponsor_party_bank_id_code",
];

static SELECT_SQL: Lazy<String> =
    Lazy::new(|| format!("SELECT {} FROM {PAYMENTS_TABLE}", PAYMENT_COLUMNS.join(", ")));

static SELECT_BY_ID_SQL: Lazy<String> = Lazy::new(|| format!("{} WHERE id = ?1;", *SELECT_SQL));

static LIST_SQL: Lazy<String> =
    Lazy::new(|| format!("{} ORDER BY id ASC LIMIT ?1 OFFSET ?2;", *SELECT_SQL));

static INSERT_SQL: Lazy<String> = Lazy::new(|| {
    let placeholders = PAYMENT_COLUMNS
        .iter()
        .map(|column| format!(":{column}"))
        .collect::<Vec<_>>();
    format!(
        "INSERT INTO {PAYMENTS_TABLE} ({}) VALUES ({});",
        PAYMENT_COLUMNS.join(", "),
        placeholders.join(", ")
    )
});

static UPDATE_SQL: Lazy<String> = Lazy::new(|| {
    let assignments = PAYMENT_COLUMNS
        .iter()
        .skip(1)
        .map(|column| format!("{column} = :{column}"))
        .collect::<Vec<_>>();
    format!(
        "UPDATE {PAYMENTS_TABLE} SET {} WHERE id = :id;",
        assignments.join(", ")
    )
});

/// How a storage failure surfaces to repository callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FailureClass {
    Conflict,
    NotFound,
    Unclassified,
}

/// Classifies a SQLite error. The only place that inspects SQLite codes.
fn classify_sqlite_error(err: &rusqlite::Error) -> FailureClass {
    match err {
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.code == ErrorCode::ConstraintViolation
                && matches!(
                    failure.extended_code,
                    ffi::SQLITE_CONSTRAINT_PRIMARYKEY | ffi::SQLITE_CONSTRAINT_UNIQUE
                ) =>
        {
            FailureClass::Conflict
        }
        rusqlite::Error::QueryReturnedNoRows => FailureClass::NotFound,
        _ => FailureClass::Unclassified,
    }
}

/// Classifies the rows-affected count of an id-addressed write.
///
/// Zero rows means the id does not exist; any other count is success.
fn classify_rows_affected(changed: usize, id: PaymentId) -> RepoResult<()> {
    if changed == 0 {
        return Err(not_found(id));
    }
    Ok(())
}

fn into_repo_error(err: rusqlite::Error, id: PaymentId) -> RepoError {
    match classify_sqlite_error(&err) {
        FailureClass::Conflict => conflict(id),
        FailureClass::NotFound => not_found(id),
        FailureClass::Unclassified => unclassified(err),
    }
}

fn unclassified(err: rusqlite::Error) -> RepoError {
    match err {
        rusqlite::Error::FromSqlConversionFailure(index, _, source) => {
            RepoError::InvalidData(format!("column {index}: {source}"))
        }
        other => RepoError::from(other),
    }
}

/// SQLite-backed payment repository.
///
/// Owns one migrated connection; calls are serialized on it.
pub struct SqlitePaymentRepository {
    conn: Mutex<Connection>,
}

impl SqlitePaymentRepository {
    /// Constructs a repository from a migrated/ready connection.
    ///
    /// # Errors
    /// - [`RepoError::UninitializedConnection`] when the schema version is not
    ///   the latest known migration.
    /// - [`RepoError::MissingRequiredTable`] / [`RepoError::MissingRequiredColumn`]
    ///   when the `payments` table does not match the column mapping.
    pub fn try_new(conn: Connection) -> RepoResult<Self> {
        ensure_connection_ready(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Number of stored payments.
    pub fn count(&self) -> RepoResult<i64> {
        let conn = self.conn()?;
        count_payments(&conn)
    }

    /// Removes every stored payment.
    pub fn delete_all(&self) -> RepoResult<()> {
        self.conn()?
            .execute(&format!("DELETE FROM {PAYMENTS_TABLE};"), [])?;
        Ok(())
    }

    fn conn(&self) -> RepoResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| RepoError::LockPoisoned("sqlite connection"))
    }
}

impl PaymentRepository for SqlitePaymentRepository {
    fn add(&self, payment: &Payment) -> RepoResult<Payment> {
        payment.validate()?;

        let columns = PaymentColumns::new(payment.id, payment, payment.version);
        self.conn()?
            .execute(INSERT_SQL.as_str(), columns.named_params().as_slice())
            .map_err(|err| into_repo_error(err, payment.id))?;

        Ok(payment.normalized())
    }

    fn get(&self, id: PaymentId) -> RepoResult<Payment> {
        self.conn()?
            .query_row(
                SELECT_BY_ID_SQL.as_str(),
                [id.to_string()],
                parse_payment_row,
            )
            .map_err(|err| into_repo_error(err, id))
    }

    fn update(&self, id: PaymentId, payment: &Payment) -> RepoResult<Payment> {
        payment.validate()?;
        let updated = updated_record(id, payment)?;

        let columns = PaymentColumns::new(id, &updated, updated.version);
        let changed = self
            .conn()?
            .execute(UPDATE_SQL.as_str(), columns.named_params().as_slice())
            .map_err(|err| into_repo_error(err, id))?;
        classify_rows_affected(changed, id)?;

        Ok(updated)
    }

    fn delete(&self, id: PaymentId) -> RepoResult<()> {
        let changed = self
            .conn()?
            .execute(
                &format!("DELETE FROM {PAYMENTS_TABLE} WHERE id = ?1;"),
                [id.to_string()],
            )
            .map_err(|err| into_repo_error(err, id))?;
        classify_rows_affected(changed, id)
    }

    fn list(&self, offset: i64, limit: i64) -> RepoResult<Vec<Payment>> {
        check_list_bounds(offset, limit)?;

        let conn = self.conn()?;
        let count = count_payments(&conn)?;
        check_offset_in_range(offset, count)?;

        let mut stmt = conn.prepare(LIST_SQL.as_str())?;
        let payments = stmt
            .query_map(params![limit, offset], parse_payment_row)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(unclassified)?;
        Ok(payments)
    }
}

fn count_payments(conn: &Connection) -> RepoResult<i64> {
    let count = conn.query_row(
        &format!("SELECT COUNT(*) FROM {PAYMENTS_TABLE};"),
        [],
        |row| row.get::<_, i64>(0),
    )?;
    Ok(count)
}

/// Flattened, bindable view of one payment.
struct PaymentColumns<'p> {
    payment: &'p Payment,
    id: String,
    organisation: String,
    version: u32,
    bearer_code: Option<&'p str>,
    receiver_charges: Option<Money>,
    sender_charges: Option<MoneyArray>,
    fx_contract_ref: Option<&'p str>,
    fx_rate: Option<&'p str>,
    fx_original_amount: Option<Money>,
}

impl<'p> PaymentColumns<'p> {
    fn new(id: PaymentId, payment: &'p Payment, version: u32) -> Self {
        let charges = payment.attributes.charges_information.as_ref();
        let fx = payment.attributes.fx.as_ref();
        Self {
            payment,
            id: id.to_string(),
            organisation: payment.organisation_id.to_string(),
            version,
            bearer_code: charges.map(|charges| charges.bearer_code.as_str()),
            receiver_charges: charges.map(ChargesInformation::receiver_charges),
            sender_charges: charges.map(|charges| MoneyArray(charges.sender_charges.clone())),
            fx_contract_ref: fx.map(|fx| fx.contract_reference.as_str()),
            fx_rate: fx.map(|fx| fx.exchange_rate.as_str()),
            fx_original_amount: fx.map(PaymentFx::original),
        }
    }

    fn named_params(&self) -> Vec<(&'static str, &dyn ToSql)> {
        let attrs = &self.payment.attributes;
        let beneficiary = &attrs.beneficiary_party;
        let debtor = &attrs.debtor_party;
        let sponsor = &attrs.sponsor_party;

        vec![
            bind(":id", &self.id),
            bind(":organisation", &self.organisation),
            bind(":version", &self.version),
            bind(":amount", &attrs.amount),
            bind(":currency", &attrs.currency),
            bind(":beneficiary_party_name", &beneficiary.account_name),
            bind(":beneficiary_party_number", &beneficiary.account_number),
            bind(
                ":beneficiary_party_number_code",
                &beneficiary.account_number_code,
            ),
            bind(":beneficiary_party_type", &beneficiary.account_type),
            bind(":beneficiary_party_address", &beneficiary.address),
            bind(":beneficiary_party_bank_id", &beneficiary.bank_id),
            bind(":beneficiary_party_bank_id_code", &beneficiary.bank_id_code),
            bind(":beneficiary_party_client_name", &beneficiary.name),
            bind(":charges_info_bearer_code", &self.bearer_code),
            bind(":charges_info_receiver_charges", &self.receiver_charges),
            bind(":charges_info_sender_charges", &self.sender_charges),
            bind(":debtor_party_name", &debtor.account_name),
            bind(":debtor_party_number", &debtor.account_number),
            bind(":debtor_party_number_code", &debtor.account_number_code),
            bind(":debtor_party_type", &debtor.account_type),
            bind(":debtor_party_address", &debtor.address),
            bind(":debtor_party_bank_id", &debtor.bank_id),
            bind(":debtor_party_bank_id_code", &debtor.bank_id_code),
            bind(":debtor_party_client_name", &debtor.name),
            bind(":e2e_reference", &attrs.end_to_end_reference),
            bind(":fx_contract_ref", &self.fx_contract_ref),
            bind(":fx_rate", &self.fx_rate),
            bind(":fx_original_amount", &self.fx_original_amount),
            bind(":numeric_reference", &attrs.numeric_reference),
            bind(":payment_id", &attrs.payment_id),
            bind(":payment_type", &attrs.payment_type),
            bind(":processing_date", &attrs.processing_date),
            bind(":purpose", &attrs.payment_purpose),
            bind(":reference", &attrs.reference),
            bind(":scheme", &attrs.payment_scheme),
            bind(":scheme_payment_subtype", &attrs.scheme_payment_sub_type),
            bind(":scheme_payment_type", &attrs.scheme_payment_type),
            bind(":sponsor_party_account_number", &sponsor.account_number),
            bind(":sponsor_party_bank_id", &sponsor.bank_id),
            bind(":sponsor_party_bank_id_code", &sponsor.bank_id_code),
        ]
    }
}

fn bind<'a>(name: &'static str, value: &'a dyn ToSql) -> (&'static str, &'a dyn ToSql) {
    (name, value)
}

/// UUID persisted in canonical hyphenated text form.
struct UuidText(Uuid);

impl FromSql for UuidText {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let text = value.as_str()?;
        Uuid::parse_str(text)
            .map(UuidText)
            .map_err(|err| FromSqlError::Other(Box::new(err)))
    }
}

fn parse_payment_row(row: &Row<'_>) -> rusqlite::Result<Payment> {
    let UuidText(id) = row.get("id")?;
    let UuidText(organisation_id) = row.get("organisation")?;

    let attributes = PaymentAttributes {
        amount: row.get("amount")?,
        currency: row.get("currency")?,
        beneficiary_party: parse_party(row, "beneficiary_party")?,
        debtor_party: parse_party(row, "debtor_party")?,
        charges_information: parse_charges(row)?,
        fx: parse_fx(row)?,
        sponsor_party: SponsorParty {
            account_number: row.get("sponsor_party_account_number")?,
            bank_id: row.get("sponsor_party_bank_id")?,
            bank_id_code: row.get("sponsor_party_bank_id_code")?,
        },
        end_to_end_reference: row.get("e2e_reference")?,
        numeric_reference: row.get("numeric_reference")?,
        payment_id: row.get("payment_id")?,
        payment_purpose: row.get("purpose")?,
        payment_scheme: row.get("scheme")?,
        payment_type: row.get("payment_type")?,
        processing_date: row.get("processing_date")?,
        reference: row.get("reference")?,
        scheme_payment_sub_type: row.get("scheme_payment_subtype")?,
        scheme_payment_type: row.get("scheme_payment_type")?,
    };

    Ok(Payment {
        resource_type: PAYMENT_RESOURCE_TYPE.to_string(),
        id,
        organisation_id,
        version: row.get("version")?,
        attributes,
    })
}

fn parse_party(row: &Row<'_>, prefix: &str) -> rusqlite::Result<PaymentParty> {
    Ok(PaymentParty {
        account_name: row.get(format!("{prefix}_name").as_str())?,
        account_number: row.get(format!("{prefix}_number").as_str())?,
        account_number_code: row.get(format!("{prefix}_number_code").as_str())?,
        account_type: row.get(format!("{prefix}_type").as_str())?,
        address: row.get(format!("{prefix}_address").as_str())?,
        bank_id: row.get(format!("{prefix}_bank_id").as_str())?,
        bank_id_code: row.get(format!("{prefix}_bank_id_code").as_str())?,
        name: row.get(format!("{prefix}_client_name").as_str())?,
    })
}

fn parse_charges(row: &Row<'_>) -> rusqlite::Result<Option<ChargesInformation>> {
    let bearer_code: Option<String> = row.get("charges_info_bearer_code")?;
    let receiver: Option<Money> = row.get("charges_info_receiver_charges")?;
    let sender: Option<MoneyArray> = row.get("charges_info_sender_charges")?;

    if bearer_code.is_none() && receiver.is_none() && sender.is_none() {
        return Ok(None);
    }

    let receiver = receiver.unwrap_or_default();
    Ok(Some(ChargesInformation {
        bearer_code: bearer_code.unwrap_or_default(),
        receiver_charges_amount: receiver.amount,
        receiver_charges_currency: receiver.currency,
        sender_charges: sender.map(|MoneyArray(items)| items).unwrap_or_default(),
    }))
}

fn parse_fx(row: &Row<'_>) -> rusqlite::Result<Option<PaymentFx>> {
    let contract_reference: Option<String> = row.get("fx_contract_ref")?;
    let exchange_rate: Option<String> = row.get("fx_rate")?;
    let original: Option<Money> = row.get("fx_original_amount")?;

    if contract_reference.is_none() && exchange_rate.is_none() && original.is_none() {
        return Ok(None);
    }

    let original = original.unwrap_or_default();
    Ok(Some(PaymentFx {
        contract_reference: contract_reference.unwrap_or_default(),
        exchange_rate: exchange_rate.unwrap_or_default(),
        original_amount: original.amount,
        original_currency: original.currency,
    }))
}

fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version = current_user_version(conn)?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    if !table_exists(conn, PAYMENTS_TABLE)? {
        return Err(RepoError::MissingRequiredTable(PAYMENTS_TABLE));
    }

    let existing = table_columns(conn, PAYMENTS_TABLE)?;
    if let Some(column) = PAYMENT_COLUMNS
        .iter()
        .copied()
        .find(|column| !existing.iter().any(|name| name == *column))
    {
        return Err(RepoError::MissingRequiredColumn {
            table: PAYMENTS_TABLE,
            column,
        });
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_columns(conn: &Connection, table: &str) -> RepoResult<Vec<String>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let columns = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(columns)
}
