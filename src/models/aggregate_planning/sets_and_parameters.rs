use std::{
    collections::{hash_map::Entry, HashMap},
    fmt::Debug,
    hash::Hash,
};

use log::{debug, trace};

use crate::config::ConfigError;
use crate::data::{schema::Table, Cost, DataError, Index, PlanningData, Quantity};
use crate::models::ModelError;

pub type ProductIndex = Index;
pub type CenterIndex = Index;
pub type ClientIndex = Index;
pub type SupplierIndex = Index;
pub type PeriodIndex = Index;

/// sets for the aggregate planning model
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(non_snake_case)]
pub struct Sets {
    /// Set of products, 1..=max product id in the demand table
    pub P: Vec<ProductIndex>,
    /// Set of production centers, 1..=max center id in the center table
    pub J: Vec<CenterIndex>,
    /// Set of clients, 1..=max client id in the demand table
    pub K: Vec<ClientIndex>,
    /// Set of suppliers, 1..=max supplier id in the supplier table
    pub Q: Vec<SupplierIndex>,
    /// Set of planning periods, 1..=max period in the demand table
    pub T: Vec<PeriodIndex>,
    /// The planning periods preceded by period 0, which holds the initial inventory
    pub T0: Vec<PeriodIndex>,
}

/// `1..=max(ids)`, failing if there are no ids at all
fn dense<I: Iterator<Item = Index>>(table: Table, ids: I) -> Result<Vec<Index>, ConfigError> {
    match ids.max() {
        Some(max) if max > 0 => Ok((1..=max).collect()),
        _ => Err(ConfigError::EmptyTable(table)),
    }
}

#[allow(non_snake_case)]
impl Sets {
    /// Derives the index sets. Empty tables and empty sets leave nothing to plan, which is a
    /// configuration error rather than a malformed row.
    pub fn new(data: &PlanningData) -> Result<Sets, ConfigError> {
        // Tables that do not define any of the sets must still hold data
        for (table, empty) in [
            (Table::Transport, data.transport.is_empty()),
            (Table::MaxSuppliers, data.max_suppliers.is_empty()),
        ] {
            if empty {
                return Err(ConfigError::EmptyTable(table));
            }
        }

        let P = dense(Table::Demand, data.demand.iter().map(|r| r.product_id))?;
        let J = dense(Table::Centers, data.centers.iter().map(|r| r.center_id))?;
        let K = dense(Table::Demand, data.demand.iter().map(|r| r.client_id))?;
        let Q = dense(Table::Suppliers, data.suppliers.iter().map(|r| r.supplier_id))?;
        let T = dense(Table::Demand, data.demand.iter().map(|r| r.period))?;
        let T0 = std::iter::once(0).chain(T.iter().copied()).collect();

        debug!(
            "Sets: {} products, {} centers, {} clients, {} suppliers, {} periods",
            P.len(),
            J.len(),
            K.len(),
            Q.len(),
            T.len()
        );

        Ok(Sets { P, J, K, Q, T, T0 })
    }
}

/// What center j can do with product i
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Capability {
    /// Maximum number of units produced per period
    pub max_production: Quantity,
    /// Maximum number of units held at the end of a period
    pub max_storage: Quantity,
    /// Cost per unit produced
    pub production_cost: Cost,
    /// Cost per unit held at the end of a period
    pub inventory_cost: Cost,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Demand {
    /// Units requested
    pub quantity: Quantity,
    /// Price paid per unit delivered
    pub purchase_price: Cost,
}

/// parameters for the aggregate planning model, keyed by the index tuple they are looked up with
#[derive(Debug, Clone)]
pub struct Parameters {
    /// keyed by (product, center)
    capability: HashMap<(ProductIndex, CenterIndex), Capability>,
    /// keyed by (product, client, period)
    demand: HashMap<(ProductIndex, ClientIndex, PeriodIndex), Demand>,
    /// transportation cost per unit, keyed by (product, center, client)
    transport: HashMap<(ProductIndex, CenterIndex, ClientIndex), Cost>,
    /// purchase cost per unit, keyed by (product, supplier, client)
    offers: HashMap<(ProductIndex, SupplierIndex, ClientIndex), Cost>,
    /// maximum units per period, keyed by (product, supplier)
    supplier_cap: HashMap<(ProductIndex, SupplierIndex), Quantity>,
}

/// Collect `rows` into a map, failing if a key occurs more than once
fn unique<K, V, I>(table: Table, rows: I) -> Result<HashMap<K, V>, DataError>
where
    K: Hash + Eq + Debug,
    I: IntoIterator<Item = (K, V)>,
{
    let mut out = HashMap::new();
    for (key, value) in rows {
        match out.entry(key) {
            Entry::Occupied(e) => {
                return Err(DataError::DuplicateKey {
                    table,
                    key: format!("{:?}", e.key()),
                })
            }
            Entry::Vacant(e) => {
                e.insert(value);
            }
        }
    }

    trace!("{} unique keys in table {}", out.len(), table);
    Ok(out)
}

impl Parameters {
    pub fn new(data: &PlanningData) -> Result<Parameters, DataError> {
        let capability = unique(
            Table::Centers,
            data.centers.iter().map(|r| {
                let capability = Capability {
                    max_production: r.max_production,
                    max_storage: r.max_storage,
                    production_cost: r.production_cost,
                    inventory_cost: r.inventory_cost,
                };
                ((r.product_id, r.center_id), capability)
            }),
        )?;

        let demand = unique(
            Table::Demand,
            data.demand.iter().map(|r| {
                let demand = Demand {
                    quantity: r.demand,
                    purchase_price: r.purchase_price,
                };
                ((r.product_id, r.client_id, r.period), demand)
            }),
        )?;

        let transport = unique(
            Table::Transport,
            data.transport
                .iter()
                .map(|r| ((r.product_id, r.center_id, r.client_id), r.transportation_cost)),
        )?;

        let offers = unique(
            Table::Suppliers,
            data.suppliers
                .iter()
                .map(|r| ((r.product_id, r.supplier_id, r.client_id), r.product_cost)),
        )?;

        let supplier_cap = unique(
            Table::MaxSuppliers,
            data.max_suppliers
                .iter()
                .map(|r| ((r.product_id, r.supplier_id), r.max_quantity)),
        )?;

        Ok(Parameters {
            capability,
            demand,
            transport,
            offers,
            supplier_cap,
        })
    }

    /// Capability of center `j` for product `i`
    pub fn capability(&self, i: ProductIndex, j: CenterIndex) -> Result<&Capability, ModelError> {
        self.capability
            .get(&(i, j))
            .ok_or_else(|| ModelError::missing(Table::Centers, (i, j)))
    }

    /// Demand of client `k` for product `i` in period `t`
    pub fn demand(
        &self,
        i: ProductIndex,
        k: ClientIndex,
        t: PeriodIndex,
    ) -> Result<&Demand, ModelError> {
        self.demand
            .get(&(i, k, t))
            .ok_or_else(|| ModelError::missing(Table::Demand, (i, k, t)))
    }

    /// Cost of shipping a unit of product `i` from center `j` to client `k`, if that lane exists
    pub fn transportation_cost(
        &self,
        i: ProductIndex,
        j: CenterIndex,
        k: ClientIndex,
    ) -> Option<Cost> {
        self.transport.get(&(i, j, k)).copied()
    }

    /// Cost of buying a unit of product `i` from supplier `q` for client `k`, if the supplier offers it
    pub fn product_cost(
        &self,
        i: ProductIndex,
        q: SupplierIndex,
        k: ClientIndex,
    ) -> Option<Cost> {
        self.offers.get(&(i, q, k)).copied()
    }

    /// Maximum units of product `i` supplier `q` delivers per period
    pub fn max_quantity(&self, i: ProductIndex, q: SupplierIndex) -> Result<Quantity, ModelError> {
        self.supplier_cap
            .get(&(i, q))
            .copied()
            .ok_or_else(|| ModelError::missing(Table::MaxSuppliers, (i, q)))
    }
}
