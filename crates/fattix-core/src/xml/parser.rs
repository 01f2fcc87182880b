//! Electronic-invoice parser: XML text to a [`ParsedInvoice`].

use quick_xml::de::from_str;
use rust_decimal::Decimal;
use tracing::debug;

use super::schema::{FatturaElettronica, LineDetail, Supplier};
use crate::error::XmlError;
use crate::models::invoice::{InvoiceLine, ParsedInvoice, SupplierCandidate};

/// Maximum length of a synthesized article code.
const ARTICLE_CODE_MAX_LEN: usize = 30;

/// Code-scheme qualifier used for supplier-assigned and synthesized codes.
const SUPPLIER_CODE_TYPE: &str = "FOR";

/// Parse electronic-invoice XML into a [`ParsedInvoice`].
///
/// Fails with [`XmlError::Malformed`] when the input is not parseable XML
/// and with [`XmlError::MissingSupplier`] when the mandatory supplier
/// element is absent. Pure transformation: no I/O.
pub fn parse_invoice(xml_text: &str, file_name: &str) -> Result<ParsedInvoice, XmlError> {
    let document: FatturaElettronica =
        from_str(xml_text).map_err(|e| XmlError::Malformed(e.to_string()))?;

    let supplier = document
        .header
        .as_ref()
        .and_then(|h| h.supplier.as_ref())
        .ok_or(XmlError::MissingSupplier)?;

    let body = document.bodies.first();
    let header = body
        .and_then(|b| b.general.as_ref())
        .and_then(|g| g.document.as_ref());

    let invoice_number = header.and_then(|d| d.number.clone()).unwrap_or_default();
    let invoice_date = header.and_then(|d| d.date.clone()).unwrap_or_default();
    let total_amount = header
        .and_then(|d| d.total_amount.as_deref())
        .map(parse_decimal)
        .unwrap_or(Decimal::ZERO);

    let lines: Vec<InvoiceLine> = body
        .and_then(|b| b.goods.as_ref())
        .map(|g| g.lines.as_slice())
        .unwrap_or_default()
        .iter()
        .enumerate()
        .filter_map(|(index, raw)| map_line(index, raw))
        .collect();

    debug!(file = file_name, lines = lines.len(), "parsed e-invoice");

    Ok(ParsedInvoice {
        file_id: file_id(file_name),
        invoice_number,
        invoice_date,
        total_amount,
        supplier: map_supplier(supplier),
        lines,
    })
}

/// The source file name with one trailing `.xml` suffix removed.
fn file_id(file_name: &str) -> String {
    file_name
        .strip_suffix(".xml")
        .unwrap_or(file_name)
        .to_string()
}

fn map_supplier(raw: &Supplier) -> SupplierCandidate {
    let registry = raw.registry.as_ref();
    let vat_id = registry.and_then(|r| r.vat_id.as_ref());
    let office = raw.office.as_ref();

    SupplierCandidate {
        tax_code: text(vat_id.and_then(|v| v.code.as_deref())),
        fiscal_code: text(registry.and_then(|r| r.fiscal_code.as_deref())),
        name: text(
            registry
                .and_then(|r| r.personal_data.as_ref())
                .and_then(|a| a.denomination.as_deref()),
        ),
        address: text(office.and_then(|o| o.street.as_deref())),
        civic_number: text(office.and_then(|o| o.civic_number.as_deref())),
        postal_code: text(office.and_then(|o| o.postal_code.as_deref())),
        city: text(office.and_then(|o| o.city.as_deref())),
        province: text(office.and_then(|o| o.province.as_deref())),
        country: text_or(office.and_then(|o| o.country.as_deref()), "Italy"),
        phone: text(
            raw.contacts
                .as_ref()
                .and_then(|c| c.phone.as_deref()),
        ),
        tax_country: text_or(vat_id.and_then(|v| v.country.as_deref()), "IT"),
    }
}

/// Map one raw line element; zero-priced or zero-quantity lines are
/// administrative rows and are dropped.
fn map_line(index: usize, raw: &LineDetail) -> Option<InvoiceLine> {
    let quantity = raw.quantity.as_deref().map(parse_decimal).unwrap_or(Decimal::ZERO);
    let unit_price = raw
        .unit_price
        .as_deref()
        .map(parse_decimal)
        .unwrap_or(Decimal::ZERO);

    if unit_price.is_zero() || quantity.is_zero() {
        return None;
    }

    let description = text(raw.description.as_deref());
    let (article_code, code_type) = article_code(raw, &description);

    Some(InvoiceLine {
        line_number: raw
            .number
            .as_deref()
            .and_then(|n| n.trim().parse().ok())
            .unwrap_or((index + 1) as u32),
        description,
        quantity,
        unit_of_measure: text(raw.unit.as_deref()),
        unit_price,
        total_price: raw
            .total_price
            .as_deref()
            .map(parse_decimal)
            .unwrap_or(Decimal::ZERO),
        vat_rate: raw
            .vat_rate
            .as_deref()
            .map(parse_decimal)
            .unwrap_or(Decimal::ZERO),
        article_code,
        code_type,
    })
}

/// Article code for a retained line.
///
/// Uses the first code element when it carries a value; otherwise
/// synthesizes a code from the description so every retained line has a
/// non-empty catalog key.
fn article_code(raw: &LineDetail, description: &str) -> (String, String) {
    match raw.article_codes.first() {
        Some(code) => {
            let value = text(code.code_value.as_deref());
            let code_type = text_or(code.code_type.as_deref(), SUPPLIER_CODE_TYPE);
            if value.is_empty() {
                (fallback_article_code(description), code_type)
            } else {
                (value, code_type)
            }
        }
        None => (
            fallback_article_code(description),
            SUPPLIER_CODE_TYPE.to_string(),
        ),
    }
}

/// Normalize a description into a catalog key: lower-case, whitespace
/// runs collapsed to single underscores, truncated to 30 characters.
fn fallback_article_code(description: &str) -> String {
    description
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .chars()
        .take(ARTICLE_CODE_MAX_LEN)
        .collect()
}

fn parse_decimal(value: &str) -> Decimal {
    value.trim().parse().unwrap_or(Decimal::ZERO)
}

fn text(value: Option<&str>) -> String {
    value.map(|v| v.trim().to_string()).unwrap_or_default()
}

fn text_or(value: Option<&str>, default: &str) -> String {
    let value = text(value);
    if value.is_empty() {
        default.to_string()
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<FatturaElettronica>
  <FatturaElettronicaHeader>
    <CedentePrestatore>
      <DatiAnagrafici>
        <IdFiscaleIVA>
          <IdPaese>IT</IdPaese>
          <IdCodice>01234567890</IdCodice>
        </IdFiscaleIVA>
        <CodiceFiscale>01234567890</CodiceFiscale>
        <Anagrafica>
          <Denominazione>Molino Rossi SRL</Denominazione>
        </Anagrafica>
      </DatiAnagrafici>
      <Sede>
        <Indirizzo>Via Roma</Indirizzo>
        <NumeroCivico>12</NumeroCivico>
        <CAP>37100</CAP>
        <Comune>Verona</Comune>
        <Provincia>VR</Provincia>
        <Nazione>Italia</Nazione>
      </Sede>
      <Contatti>
        <Telefono>0451234567</Telefono>
      </Contatti>
    </CedentePrestatore>
  </FatturaElettronicaHeader>
  <FatturaElettronicaBody>
    <DatiGenerali>
      <DatiGeneraliDocumento>
        <Numero>FT-2024-001</Numero>
        <Data>2024-03-01</Data>
        <ImportoTotaleDocumento>146.40</ImportoTotaleDocumento>
      </DatiGeneraliDocumento>
    </DatiGenerali>
    <DatiBeniServizi>
      <DettaglioLinee>
        <NumeroLinea>1</NumeroLinea>
        <CodiceArticolo>
          <CodiceTipo>EAN</CodiceTipo>
          <CodiceValore>8001234567890</CodiceValore>
        </CodiceArticolo>
        <Descrizione>Farina tipo 00</Descrizione>
        <Quantita>10.00</Quantita>
        <UnitaMisura>KG</UnitaMisura>
        <PrezzoUnitario>12.00</PrezzoUnitario>
        <PrezzoTotale>120.00</PrezzoTotale>
        <AliquotaIVA>22.00</AliquotaIVA>
      </DettaglioLinee>
      <DettaglioLinee>
        <NumeroLinea>2</NumeroLinea>
        <Descrizione>Sconto promozionale</Descrizione>
        <Quantita>1.00</Quantita>
        <PrezzoUnitario>0.00</PrezzoUnitario>
        <PrezzoTotale>0.00</PrezzoTotale>
        <AliquotaIVA>22.00</AliquotaIVA>
      </DettaglioLinee>
    </DatiBeniServizi>
  </FatturaElettronicaBody>
</FatturaElettronica>"#;

    #[test]
    fn parses_header_and_supplier() {
        let invoice = parse_invoice(SAMPLE, "FT-2024-001.xml").unwrap();

        assert_eq!(invoice.file_id, "FT-2024-001");
        assert_eq!(invoice.invoice_number, "FT-2024-001");
        assert_eq!(invoice.invoice_date, "2024-03-01");
        assert_eq!(invoice.total_amount, Decimal::new(14640, 2));

        assert_eq!(invoice.supplier.tax_code, "01234567890");
        assert_eq!(invoice.supplier.name, "Molino Rossi SRL");
        assert_eq!(invoice.supplier.city, "Verona");
        assert_eq!(invoice.supplier.country, "Italia");
        assert_eq!(invoice.supplier.tax_country, "IT");
        assert_eq!(invoice.supplier.phone, "0451234567");
    }

    #[test]
    fn drops_zero_valued_lines() {
        let invoice = parse_invoice(SAMPLE, "FT-2024-001.xml").unwrap();

        assert_eq!(invoice.lines.len(), 1);
        let line = &invoice.lines[0];
        assert_eq!(line.line_number, 1);
        assert_eq!(line.description, "Farina tipo 00");
        assert_eq!(line.quantity, Decimal::new(1000, 2));
        assert_eq!(line.unit_of_measure, "KG");
        assert_eq!(line.unit_price, Decimal::new(1200, 2));
        assert_eq!(line.total_price, Decimal::new(12000, 2));
        assert_eq!(line.vat_rate, Decimal::new(2200, 2));
        assert_eq!(line.article_code, "8001234567890");
        assert_eq!(line.code_type, "EAN");
    }

    #[test]
    fn synthesizes_article_code_from_description() {
        let xml = line_fixture(
            "<Descrizione>Pasta  Di Grano   Duro</Descrizione>\
             <Quantita>2.00</Quantita><PrezzoUnitario>1.50</PrezzoUnitario>",
        );
        let invoice = parse_invoice(&xml, "inv.xml").unwrap();

        assert_eq!(invoice.lines[0].article_code, "pasta_di_grano_duro");
        assert_eq!(invoice.lines[0].code_type, "FOR");
    }

    #[test]
    fn synthesized_code_is_truncated() {
        let xml = line_fixture(
            "<Descrizione>Confezione straordinariamente grande di biscotti</Descrizione>\
             <Quantita>1.00</Quantita><PrezzoUnitario>3.00</PrezzoUnitario>",
        );
        let invoice = parse_invoice(&xml, "inv.xml").unwrap();

        let code = &invoice.lines[0].article_code;
        assert_eq!(code.chars().count(), 30);
        assert_eq!(code, "confezione_straordinariamente_");
    }

    #[test]
    fn empty_code_type_defaults_to_supplier_scheme() {
        let xml = line_fixture(
            "<CodiceArticolo><CodiceTipo></CodiceTipo><CodiceValore>A-1</CodiceValore></CodiceArticolo>\
             <Descrizione>Olio</Descrizione>\
             <Quantita>1.00</Quantita><PrezzoUnitario>5.00</PrezzoUnitario>",
        );
        let invoice = parse_invoice(&xml, "inv.xml").unwrap();

        assert_eq!(invoice.lines[0].article_code, "A-1");
        assert_eq!(invoice.lines[0].code_type, "FOR");
    }

    #[test]
    fn missing_supplier_sub_fields_default_to_empty() {
        let xml = r#"<FatturaElettronica>
          <FatturaElettronicaHeader>
            <CedentePrestatore>
              <DatiAnagrafici>
                <IdFiscaleIVA><IdCodice>999</IdCodice></IdFiscaleIVA>
              </DatiAnagrafici>
            </CedentePrestatore>
          </FatturaElettronicaHeader>
        </FatturaElettronica>"#;
        let invoice = parse_invoice(xml, "inv.xml").unwrap();

        assert_eq!(invoice.supplier.phone, "");
        assert_eq!(invoice.supplier.address, "");
        assert_eq!(invoice.supplier.fiscal_code, "");
        assert_eq!(invoice.supplier.country, "Italy");
        assert_eq!(invoice.supplier.tax_country, "IT");
        assert_eq!(invoice.invoice_number, "");
        assert_eq!(invoice.total_amount, Decimal::ZERO);
        assert!(invoice.lines.is_empty());
    }

    #[test]
    fn missing_supplier_element_is_rejected() {
        let xml = "<FatturaElettronica><FatturaElettronicaHeader>\
                   </FatturaElettronicaHeader></FatturaElettronica>";
        let err = parse_invoice(xml, "inv.xml").unwrap_err();
        assert!(matches!(err, XmlError::MissingSupplier));
    }

    #[test]
    fn malformed_xml_is_rejected() {
        let err = parse_invoice("<FatturaElettronica><broken", "inv.xml").unwrap_err();
        assert!(matches!(err, XmlError::Malformed(_)));
    }

    #[test]
    fn unparseable_total_defaults_to_zero() {
        let xml = line_fixture("").replace(
            "<DatiGeneraliDocumento>",
            "<DatiGeneraliDocumento><ImportoTotaleDocumento>n/a</ImportoTotaleDocumento>",
        );
        let invoice = parse_invoice(&xml, "inv.xml").unwrap();
        assert_eq!(invoice.total_amount, Decimal::ZERO);
    }

    #[test]
    fn file_id_strips_only_trailing_xml_suffix() {
        assert_eq!(file_id("INV-2024-001.xml"), "INV-2024-001");
        assert_eq!(file_id("archive.xml.xml"), "archive.xml");
        assert_eq!(file_id("scan.pdf"), "scan.pdf");
    }

    /// Minimal document with one configurable line element.
    fn line_fixture(line_body: &str) -> String {
        format!(
            "<FatturaElettronica>\
               <FatturaElettronicaHeader>\
                 <CedentePrestatore>\
                   <DatiAnagrafici>\
                     <IdFiscaleIVA><IdPaese>IT</IdPaese><IdCodice>01234567890</IdCodice></IdFiscaleIVA>\
                   </DatiAnagrafici>\
                 </CedentePrestatore>\
               </FatturaElettronicaHeader>\
               <FatturaElettronicaBody>\
                 <DatiGenerali><DatiGeneraliDocumento>\
                   <Numero>FT-1</Numero><Data>2024-01-01</Data>\
                 </DatiGeneraliDocumento></DatiGenerali>\
                 <DatiBeniServizi><DettaglioLinee>{line_body}</DettaglioLinee></DatiBeniServizi>\
               </FatturaElettronicaBody>\
             </FatturaElettronica>"
        )
    }
}
