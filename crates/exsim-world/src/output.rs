//! CSV writers for simulation outputs.
//!
//! Optional fields are written as empty columns, matching the
//! `ts,best_bid,best_ask,mid` convention consumers of these files expect.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use exsim_core::types::Trade;
use exsim_core::Result;

use crate::world::BookTop;

/// Write trades as `trade_id,ts,price,qty,maker_id,taker_id`.
pub fn write_trades_csv<P: AsRef<Path>>(path: P, trades: &[Trade]) -> Result<()> {
    let mut w = BufWriter::new(File::create(path)?);
    writeln!(w, "trade_id,ts,price,qty,maker_id,taker_id")?;
    for t in trades {
        writeln!(
            w,
            "{},{},{},{},{},{}",
            t.id, t.ts, t.price, t.qty, t.maker_order_id, t.taker_order_id
        )?;
    }
    w.flush()?;
    Ok(())
}

/// Write the top-of-book series as `ts,best_bid,best_ask,mid`.
pub fn write_top_csv<P: AsRef<Path>>(path: P, tops: &[BookTop]) -> Result<()> {
    let mut w = BufWriter::new(File::create(path)?);
    writeln!(w, "ts,best_bid,best_ask,mid")?;
    for top in tops {
        write!(w, "{},", top.ts)?;
        if let Some(bid) = top.best_bid {
            write!(w, "{bid}")?;
        }
        write!(w, ",")?;
        if let Some(ask) = top.best_ask {
            write!(w, "{ask}")?;
        }
        write!(w, ",")?;
        if let Some(mid) = top.mid {
            write!(w, "{mid}")?;
        }
        writeln!(w)?;
    }
    w.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use exsim_core::types::{OrderId, Price, Qty, TradeId, Ts};

    #[test]
    fn test_trades_csv_layout() {
        let trades = vec![Trade {
            id: TradeId::new(1),
            ts: Ts::from_nanos(20),
            price: Price::from_ticks(105),
            qty: Qty::new(8),
            maker_order_id: OrderId::new(1),
            taker_order_id: OrderId::new(100),
        }];

        let path = std::env::temp_dir().join("exsim_test_trades.csv");
        write_trades_csv(&path, &trades).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(
            contents,
            "trade_id,ts,price,qty,maker_id,taker_id\n1,20,105,8,1,100\n"
        );
    }

    #[test]
    fn test_top_csv_empty_optionals() {
        let tops = vec![
            BookTop {
                ts: Ts::from_nanos(0),
                best_bid: None,
                best_ask: Some(Price::from_ticks(105)),
                mid: None,
            },
            BookTop {
                ts: Ts::from_nanos(1),
                best_bid: Some(Price::from_ticks(100)),
                best_ask: Some(Price::from_ticks(104)),
                mid: Some(Price::from_ticks(102)),
            },
        ];

        let path = std::env::temp_dir().join("exsim_test_top.csv");
        write_top_csv(&path, &tops).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(
            contents,
            "ts,best_bid,best_ask,mid\n0,,105,\n1,100,104,102\n"
        );
    }
}
