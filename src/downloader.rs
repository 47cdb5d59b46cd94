use crate::filter::FilteredView;
use crate::record::{
    COL_BRAND, COL_CATEGORY, COL_PRODUCT, COL_QUANTITY, COL_REVENUE, COL_SALE_DATE, COL_STORE,
    COL_STORE_TYPE,
};
use std::error::Error;

/// Header row of every export, in the column order of the source workbook.
pub const EXPORT_HEADER: [&str; 8] = [
    COL_SALE_DATE,
    COL_PRODUCT,
    COL_BRAND,
    COL_STORE,
    COL_STORE_TYPE,
    COL_CATEGORY,
    COL_QUANTITY,
    COL_REVENUE,
];

/// Convert the filtered rows to CSV format
///
/// The header row uses the original column names, dates are written as `YYYY-MM-DD`,
/// so the output can be uploaded again as-is.
///
/// # Arguments
/// * `view` - The rows left after filtering
///
/// # Returns
/// * `Result<Vec<u8>, Box<dyn Error>>` - CSV content or an error
///
/// # Examples
/// ```
/// use sales_dashboard::downloader::to_csv;
/// use sales_dashboard::filter::{FilterCriteria, apply};
/// use sales_dashboard::record::Dataset;
///
/// let dataset = Dataset::default();
/// let view = apply(&dataset, &FilterCriteria::for_dataset(&dataset));
/// match to_csv(&view) {
///     Ok(csv) => println!("CSV generated: {} bytes", csv.len()),
///     Err(e) => eprintln!("Failed to generate CSV: {}", e),
/// }
/// ```
pub fn to_csv(view: &FilteredView<'_>) -> Result<Vec<u8>, Box<dyn Error>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(EXPORT_HEADER)?;

    for record in view.iter() {
        writer.write_record([
            record.sale_date.format("%Y-%m-%d").to_string(),
            record.product.clone(),
            record.brand.clone(),
            record.store.clone(),
            record.store_type.clone(),
            record.category.clone(),
            record.quantity.to_string(),
            record.revenue.to_string(),
        ])?;
    }

    let buffer = writer.into_inner().map_err(|e| e.into_error())?;

    Ok(buffer)
}

/// Convert the filtered rows to XLSX format
///
/// Dates are stored as Excel serials with a date format, quantities and revenue as numbers.
///
/// # Arguments
/// * `view` - The rows left after filtering
///
/// # Returns
/// * `Result<Vec<u8>, Box<dyn Error>>` - XLSX file content as bytes or an error
#[cfg(feature = "web")]
pub fn to_xlsx(view: &FilteredView<'_>) -> Result<Vec<u8>, Box<dyn Error>> {
    use crate::record::date_to_excel_serial;
    use rust_xlsxwriter::{Format, Workbook, Worksheet};

    let mut workbook = Workbook::new();
    let mut worksheet = Worksheet::new();
    worksheet.set_name("Vendas")?;

    let bold = Format::new().set_bold();
    let date_format = Format::new().set_num_format("yyyy-mm-dd");
    let money_format = Format::new().set_num_format("#,##0.00");

    for (col, name) in EXPORT_HEADER.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, *name, &bold)?;
    }

    for (i, record) in view.iter().enumerate() {
        let row = i as u32 + 1;
        worksheet.write_number_with_format(
            row,
            0,
            date_to_excel_serial(record.sale_date),
            &date_format,
        )?;
        worksheet.write_string(row, 1, record.product.as_str())?;
        worksheet.write_string(row, 2, record.brand.as_str())?;
        worksheet.write_string(row, 3, record.store.as_str())?;
        worksheet.write_string(row, 4, record.store_type.as_str())?;
        worksheet.write_string(row, 5, record.category.as_str())?;
        worksheet.write_number(row, 6, record.quantity as f64)?;
        worksheet.write_number_with_format(row, 7, record.revenue, &money_format)?;
    }

    workbook.push_worksheet(worksheet);

    let buffer = workbook.save_to_buffer()?;

    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{FilterCriteria, apply};
    use crate::loader;
    use crate::record::tests::sample_dataset;

    #[test]
    fn csv_starts_with_source_header() {
        let ds = sample_dataset();
        let view = apply(&ds, &FilterCriteria::for_dataset(&ds));
        let csv = String::from_utf8(to_csv(&view).unwrap()).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next(),
            Some("Data da Venda,Produto,Marca,Loja,Tipo Loja,Categoria,Qtd Vendida,Faturamento")
        );
        assert_eq!(lines.count(), 3);
    }

    #[test]
    fn csv_export_loads_back_as_filtered_rows() {
        let ds = sample_dataset();
        let view = apply(&ds, &FilterCriteria::for_dataset(&ds).with_stores(["Store1"]));
        let bytes = to_csv(&view).unwrap();
        let reloaded = loader::from_csv_reader(bytes.as_slice()).unwrap();
        assert_eq!(reloaded, view.materialize());
    }

    #[cfg(feature = "web")]
    #[test]
    fn xlsx_export_loads_back_as_filtered_rows() {
        let ds = sample_dataset();
        let view = apply(&ds, &FilterCriteria::for_dataset(&ds).with_brands(["BrandX"]));
        let bytes = to_xlsx(&view).unwrap();
        let reloaded = loader::from_workbook_bytes(bytes).unwrap();
        assert_eq!(reloaded, view.materialize());
    }

    #[cfg(feature = "web")]
    #[test]
    fn xlsx_export_of_empty_view_has_header_only() {
        let ds = sample_dataset();
        let view = apply(&ds, &FilterCriteria::for_dataset(&ds).with_products(["Nope"]));
        let reloaded = loader::from_workbook_bytes(to_xlsx(&view).unwrap()).unwrap();
        assert!(reloaded.is_empty());
    }
}
