pub fn codeblock_fixture() -> &'static str {
    return r#"
Here's how to print in Rust.

```rust
fn print_numbers() {
    for i in 0..=0 {
        println!("{i}");
    }
}
```

And in Javascript.

```javascript
function printNumbers() {
    let numbers = [];
    for (let i = 0; i <= 10; i++) {
        numbers.push(i);
    }
    return numbers.join('\n');
}
```

This one has no language attached.

```
abc123
```

Let's do Python as well!

```python
for i in range(11):
    print(i)
```

That's it!
"#
    .trim();
}

pub fn weather_table_fixture() -> &'static str {
    return r#"
## 7-Day Weather Forecast

| Date | Max Temp (°C) | Min Temp (°C) | Precipitation (mm) |
|------|--------------|--------------|-------------------|
| 2024-11-18 | 9.4 | 3.1 | 0.0 |
| 2024-11-19 | 11.2 | 5.8 | 2.4 |

Data source: Open-Meteo Weather API
"#
    .trim();
}
