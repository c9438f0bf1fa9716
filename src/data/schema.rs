use derive_more::Display;

/// The five input tables of the planning data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum Table {
    #[display(fmt = "centers")]
    Centers,
    #[display(fmt = "demand")]
    Demand,
    #[display(fmt = "transport")]
    Transport,
    #[display(fmt = "suppliers")]
    Suppliers,
    #[display(fmt = "max_suppliers")]
    MaxSuppliers,
}

impl Table {
    pub const ALL: [Table; 5] = [
        Table::Centers,
        Table::Demand,
        Table::Transport,
        Table::Suppliers,
        Table::MaxSuppliers,
    ];

    /// Name of the sheet holding the table in the planning workbook
    pub fn sheet_name(&self) -> &'static str {
        match self {
            Table::Centers => "Plantas",
            Table::Demand => "Demanda",
            Table::Transport => "Red Logistica",
            Table::Suppliers => "Proveedores",
            Table::MaxSuppliers => "Cant. Máxima Proveedores",
        }
    }

    /// File name of the table when the planning data is a directory of csv files
    pub fn file_name(&self) -> String {
        format!("{}.csv", self)
    }

    /// Mapping from the column headers of the sheet to canonical field names
    pub fn columns(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            Table::Centers => &[
                ("Producto", "product_id"),
                ("Planta", "center_id"),
                ("Costo de produccion por unidad (MXN)", "production_cost"),
                ("Capacidad máxima de producción de unidades", "max_production"),
                ("Capacidad máxima de almacenamiento de unidades", "max_storage"),
                ("Costo de almacenamiento por unidad (MXN)", "inventory_cost"),
            ],
            Table::Demand => &[
                ("Cliente", "client_id"),
                ("Id producto", "product_id"),
                ("Periodo", "period"),
                ("Demanda de unidades", "demand"),
                ("Precio de Compra por unidad (MXN)", "purchase_price"),
            ],
            Table::Transport => &[
                ("Producto", "product_id"),
                ("Planta", "center_id"),
                ("Cliente", "client_id"),
                ("Costo de transporte  por unidad (MXN)", "transportation_cost"),
            ],
            Table::Suppliers => &[
                ("Producto", "product_id"),
                ("Proveedor", "supplier_id"),
                ("Cliente", "client_id"),
                ("Costo de compra de producto terminado", "product_cost"),
            ],
            Table::MaxSuppliers => &[
                ("Producto", "product_id"),
                ("Proveedor", "supplier_id"),
                ("Cantidad", "max_quantity"),
            ],
        }
    }

    /// The canonical field name of a raw header, if the header belongs to this table.
    /// Surrounding whitespace is ignored.
    pub fn field(&self, header: &str) -> Option<&'static str> {
        let header = header.trim();
        self.columns()
            .iter()
            .find(|(raw, _)| raw.trim() == header)
            .map(|(_, field)| *field)
    }

    /// The raw header of a canonical field
    pub fn header(&self, field: &str) -> Option<&'static str> {
        self.columns()
            .iter()
            .find(|(_, f)| *f == field)
            .map(|(raw, _)| *raw)
    }
}
