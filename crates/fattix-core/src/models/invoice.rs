//! Invoice value objects produced by the electronic-invoice parser.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single retained invoice line.
///
/// Lines whose unit price or quantity is zero are administrative rows in
/// the source format and never reach this type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceLine {
    /// Sequential line number from the source document.
    pub line_number: u32,

    /// Product/service description.
    pub description: String,

    /// Quantity.
    pub quantity: Decimal,

    /// Unit of measure.
    pub unit_of_measure: String,

    /// Unit price (net).
    pub unit_price: Decimal,

    /// Total price for this line.
    pub total_price: Decimal,

    /// Applicable VAT rate (percentage).
    pub vat_rate: Decimal,

    /// Article/catalog code. Never empty: synthesized from the
    /// description when the source carries no code element.
    pub article_code: String,

    /// Code scheme qualifier (supplier code `"FOR"` when synthesized).
    pub code_type: String,
}

/// Supplier data extracted from the invoice header.
///
/// Created transiently from XML and never mutated after parse. Missing
/// sub-fields default to the empty string rather than being absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SupplierCandidate {
    /// VAT/tax code. The only required key for supplier resolution.
    pub tax_code: String,

    /// Fiscal code, when distinct from the tax code.
    pub fiscal_code: String,

    /// Legal name.
    pub name: String,

    /// Street address.
    pub address: String,

    /// Civic number.
    pub civic_number: String,

    /// Postal code.
    pub postal_code: String,

    /// City.
    pub city: String,

    /// Province.
    pub province: String,

    /// Country, `"Italy"` when the document does not state one.
    pub country: String,

    /// Phone number, empty when absent.
    pub phone: String,

    /// Tax-country code, `"IT"` when the document does not state one.
    pub tax_country: String,
}

/// A fully parsed electronic invoice.
///
/// Created once per source file by the XML parser and consumed exactly
/// once by the batch orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedInvoice {
    /// Source file name with the trailing `.xml` suffix stripped.
    pub file_id: String,

    /// Invoice number as printed on the document.
    pub invoice_number: String,

    /// Invoice date, raw string from the document. Not validated here.
    pub invoice_date: String,

    /// Document total, zero when absent or unparseable.
    pub total_amount: Decimal,

    /// Supplier data from the header.
    pub supplier: SupplierCandidate,

    /// Retained line items, in document order.
    pub lines: Vec<InvoiceLine>,
}
