pub mod config;
pub use config::{
    AccountConfig, Build, DEFAULT_LOCALE, DEFAULT_PAGE_SIZE, EXCHANGE_2007, EXCHANGE_2007_SP1,
    EXCHANGE_2010, EXCHANGE_2010_SP1, EXCHANGE_2013, EXCHANGE_2016,
};
