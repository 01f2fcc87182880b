//! Raw deserialization schema for the electronic-invoice format.
//!
//! These structs mirror the source XML element names one-to-one and keep
//! every field optional; domain defaults are applied in the mapping pass,
//! not here. Unknown elements are ignored, so documents carrying the full
//! national schema still deserialize.

use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct FatturaElettronica {
    #[serde(rename = "FatturaElettronicaHeader")]
    pub header: Option<Header>,

    /// The format allows multiple bodies; header lookups take the first.
    #[serde(rename = "FatturaElettronicaBody", default)]
    pub bodies: Vec<Body>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Header {
    #[serde(rename = "CedentePrestatore")]
    pub supplier: Option<Supplier>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Supplier {
    #[serde(rename = "DatiAnagrafici")]
    pub registry: Option<Registry>,

    #[serde(rename = "Sede")]
    pub office: Option<Office>,

    #[serde(rename = "Contatti")]
    pub contacts: Option<Contacts>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Registry {
    #[serde(rename = "IdFiscaleIVA")]
    pub vat_id: Option<VatId>,

    #[serde(rename = "CodiceFiscale")]
    pub fiscal_code: Option<String>,

    #[serde(rename = "Anagrafica")]
    pub personal_data: Option<PersonalData>,
}

#[derive(Debug, Default, Deserialize)]
pub struct VatId {
    #[serde(rename = "IdPaese")]
    pub country: Option<String>,

    #[serde(rename = "IdCodice")]
    pub code: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PersonalData {
    #[serde(rename = "Denominazione")]
    pub denomination: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Office {
    #[serde(rename = "Indirizzo")]
    pub street: Option<String>,

    #[serde(rename = "NumeroCivico")]
    pub civic_number: Option<String>,

    #[serde(rename = "CAP")]
    pub postal_code: Option<String>,

    #[serde(rename = "Comune")]
    pub city: Option<String>,

    #[serde(rename = "Provincia")]
    pub province: Option<String>,

    #[serde(rename = "Nazione")]
    pub country: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Contacts {
    #[serde(rename = "Telefono")]
    pub phone: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Body {
    #[serde(rename = "DatiGenerali")]
    pub general: Option<GeneralData>,

    #[serde(rename = "DatiBeniServizi")]
    pub goods: Option<GoodsData>,
}

#[derive(Debug, Default, Deserialize)]
pub struct GeneralData {
    #[serde(rename = "DatiGeneraliDocumento")]
    pub document: Option<DocumentData>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DocumentData {
    #[serde(rename = "Numero")]
    pub number: Option<String>,

    #[serde(rename = "Data")]
    pub date: Option<String>,

    #[serde(rename = "ImportoTotaleDocumento")]
    pub total_amount: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct GoodsData {
    #[serde(rename = "DettaglioLinee", default)]
    pub lines: Vec<LineDetail>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LineDetail {
    #[serde(rename = "NumeroLinea")]
    pub number: Option<String>,

    /// A line may carry several code elements; the first one wins.
    #[serde(rename = "CodiceArticolo", default)]
    pub article_codes: Vec<ArticleCode>,

    #[serde(rename = "Descrizione")]
    pub description: Option<String>,

    #[serde(rename = "Quantita")]
    pub quantity: Option<String>,

    #[serde(rename = "UnitaMisura")]
    pub unit: Option<String>,

    #[serde(rename = "PrezzoUnitario")]
    pub unit_price: Option<String>,

    #[serde(rename = "PrezzoTotale")]
    pub total_price: Option<String>,

    #[serde(rename = "AliquotaIVA")]
    pub vat_rate: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ArticleCode {
    #[serde(rename = "CodiceTipo")]
    pub code_type: Option<String>,

    #[serde(rename = "CodiceValore")]
    pub code_value: Option<String>,
}
