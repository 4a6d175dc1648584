use eframe::egui::{ScrollArea, Ui};
use egui_extras::{Column as TableColumn, TableBuilder};

use defect_dashboard::data::columns::DateStyle;
use defect_dashboard::data::model::Record;
use defect_dashboard::state::AppState;

const ROW_HEIGHT: f32 = 20.0;
const TABLE_HEIGHT: f32 = 400.0;

/// The filtered defects, one row each, in dataset order.
pub fn detail_table(ui: &mut Ui, state: &AppState) {
    let columns = state.table_columns();
    let records: Vec<&Record> = state.visible_records().collect();

    ScrollArea::horizontal().id_salt("detail_table_scroll").show(ui, |ui: &mut Ui| {
        TableBuilder::new(ui)
            .striped(true)
            .resizable(true)
            .max_scroll_height(TABLE_HEIGHT)
            .columns(TableColumn::auto().at_least(80.0), columns.len())
            .header(ROW_HEIGHT + 4.0, |mut header| {
                for col in &columns {
                    header.col(|ui: &mut Ui| {
                        ui.strong(col.header());
                    });
                }
            })
            .body(|body| {
                body.rows(ROW_HEIGHT, records.len(), |mut row| {
                    let rec = records[row.index()];
                    for col in &columns {
                        row.col(|ui: &mut Ui| {
                            ui.label(col.cell(rec, DateStyle::Display));
                        });
                    }
                });
            });
    });
}
